pub mod resolver;
pub mod view;

pub use resolver::{ResolvedTarget, TargetDetail, TargetResolver};
pub use view::{RelatedItem, TargetSummary, TargetView};
