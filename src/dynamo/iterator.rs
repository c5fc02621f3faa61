use std::time::Instant;

use async_trait::async_trait;
use tokio::sync::Mutex;

use crate::dynamo::attributes::Attributes;
use crate::dynamo::dosage::Dosage;
use crate::dynamo::frame::AwsFrame;
use crate::dynamo::item::Item;
use crate::error::{Error, Result};

/// Stateful cursor over the records of a frame.
#[async_trait]
pub trait Cursor: Send + Sync {
    /// True when another record can be read. Calling it repeatedly without
    /// `next` gives the same answer and skips nothing.
    async fn has_next(&self) -> Result<bool>;

    /// Advance to the next record.
    async fn next(&self) -> Result<Item>;

    /// Delete the record last returned by `next`.
    async fn remove(&self) -> Result<()>;
}

/// Current page with one record cut out of it.
///
/// Paging continues from the page it replaced.
pub struct FixedDosage {
    items: Vec<Attributes>,
    origin: Box<dyn Dosage>,
}

impl FixedDosage {
    /// `items` in place of the page of `origin`, which still pages on.
    pub fn new(items: Vec<Attributes>, origin: Box<dyn Dosage>) -> Self {
        Self { items, origin }
    }
}

#[async_trait]
impl Dosage for FixedDosage {
    fn items(&self) -> &[Attributes] {
        &self.items
    }

    fn has_next(&self) -> bool {
        self.origin.has_next()
    }

    async fn next(&self) -> Result<Box<dyn Dosage>> {
        self.origin.next().await
    }
}

struct State {
    dosage: Option<Box<dyn Dosage>>,
    position: isize,
}

/// Cursor that pulls pages lazily through the frame's valve.
pub struct AwsIterator {
    frame: AwsFrame,
    state: Mutex<State>,
}

impl AwsIterator {
    /// Cursor over `frame`; nothing is fetched until the first call.
    pub fn new(frame: AwsFrame) -> Self {
        Self {
            frame,
            state: Mutex::new(State {
                dosage: None,
                position: -1,
            }),
        }
    }

    /// Make sure an unconsumed record is in the current page, fetching pages
    /// as needed. A failed fetch leaves the last good page in place.
    async fn advance(&self, state: &mut State) -> Result<bool> {
        if state.dosage.is_none() {
            let keys = self.frame.table.keys().await?;
            let dosage = self
                .frame
                .valve
                .fetch(
                    self.frame.credentials.clone(),
                    &self.frame.name,
                    &self.frame.conditions,
                    &keys,
                )
                .await?;
            state.dosage = Some(dosage);
            state.position = -1;
        }
        loop {
            let Some(dosage) = state.dosage.as_ref() else {
                return Ok(false);
            };
            if state.position + 1 < dosage.items().len() as isize {
                return Ok(true);
            }
            if !dosage.has_next() {
                return Ok(false);
            }
            let next = dosage.next().await?;
            state.dosage = Some(next);
            state.position = -1;
        }
    }
}

#[async_trait]
impl Cursor for AwsIterator {
    async fn has_next(&self) -> Result<bool> {
        let mut state = self.state.lock().await;
        self.advance(&mut state).await
    }

    async fn next(&self) -> Result<Item> {
        let mut state = self.state.lock().await;
        if !self.advance(&mut state).await? {
            return Err(Error::Exhausted(format!(
                "No more items in the frame, position={}",
                state.position
            )));
        }
        state.position += 1;
        let attributes = state
            .dosage
            .as_ref()
            .and_then(|dosage| dosage.items().get(state.position as usize))
            .cloned()
            .ok_or_else(|| {
                Error::IllegalState(format!("No record at position {}", state.position))
            })?;
        Ok(Item::new(
            self.frame.credentials.clone(),
            self.frame.clone(),
            &self.frame.name,
            attributes,
            self.frame.table.keys().await?,
        ))
    }

    async fn remove(&self) -> Result<()> {
        let mut state = self.state.lock().await;
        let Some(dosage) = state.dosage.as_ref() else {
            return Err(Error::IllegalState(
                "You can't call remove() until you call next()".to_string(),
            ));
        };
        if state.position < 0 {
            return Err(Error::IllegalState(
                "No record is selected, call next() before remove()".to_string(),
            ));
        }
        let position = state.position as usize;
        let item = dosage.items().get(position).cloned().ok_or_else(|| {
            Error::IllegalState(format!("No record at position {position}"))
        })?;

        let keys = self.frame.table.keys().await?;
        let key = item.only(&keys);
        let aws = self.frame.credentials.aws().await?;
        let start = Instant::now();
        let reply = aws
            .delete_item(&self.frame.name, &key, Some(&key))
            .await
            .map_err(|e| {
                e.context(format!(
                    "Failed to delete at \"{}\" by keys {}",
                    self.frame.name, key
                ))
            })?;
        log::info!(
            "#remove(): item #{} removed from DynamoDB, {}, in {}ms",
            position,
            reply.capacity,
            start.elapsed().as_millis()
        );

        let mut items = dosage.items().to_vec();
        items.remove(position);
        if let Some(origin) = state.dosage.take() {
            state.dosage = Some(Box::new(FixedDosage::new(items, origin)));
        }
        state.position -= 1;
        Ok(())
    }
}
