pub mod descriptor;
pub mod neutral_type;
pub mod value;

pub use descriptor::Column;
pub use neutral_type::NeutralType;
pub use value::SqlValue;
