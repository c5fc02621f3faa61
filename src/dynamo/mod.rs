pub mod attributes;
pub mod conditions;
pub mod dosage;
pub mod frame;
pub mod item;
pub mod iterator;
mod parse;
pub mod queryvalve;
pub mod region;
pub mod request;
pub mod scanvalve;
pub mod serviceclient;
pub mod table;
pub mod tabledescription;
pub mod transport;
pub mod valve;
pub mod value;
mod wire;

pub use attributes::{AttributeAction, AttributeUpdates, AttributeValueUpdate, Attributes};
pub use conditions::{ComparisonOperator, Condition, Conditions};
pub use dosage::{Dosage, EmptyDosage, RemoteDosage};
pub use frame::{AwsFrame, Frame};
pub use item::Item;
pub use iterator::{AwsIterator, Cursor, FixedDosage};
pub use queryvalve::QueryValve;
pub use region::{Prefixed, Region};
pub use request::{Operation, PageRequest, Select};
pub use scanvalve::ScanValve;
pub use serviceclient::ServiceClient;
pub use table::{AwsTable, Table};
pub use transport::{Capacity, Page, Reply, Transport};
pub use valve::Valve;
pub use value::AttributeValue;
