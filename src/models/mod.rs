pub mod conversation;
pub mod cost;
pub mod pricing;
pub mod roles;

pub use conversation::{ConversationDto, ConversationRecord};
pub use cost::{AppliedPrice, CostedConversation};
pub use pricing::{CurrentPrice, PriceVersion, PricingDto};
pub use roles::RoleFlags;
