mod array_value;
mod map_value;
mod value;

pub use array_value::ArrayValue;
pub use map_value::MapValue;
pub use value::{StoreValue, ValueKind};
