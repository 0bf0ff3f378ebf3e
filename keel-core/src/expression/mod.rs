mod expression;
mod filter;
mod op_code;
mod operand;
mod ordered;

pub use expression::*;
pub use filter::*;
pub use op_code::*;
pub use operand::*;
pub use ordered::*;
