pub mod class;
pub mod field;
pub mod registry;

pub use class::ClassLayout;
pub use field::{FieldDescriptor, FieldScope, FieldSpec, WidthClass};
pub use registry::FieldRegistry;
