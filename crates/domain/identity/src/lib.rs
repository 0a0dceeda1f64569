//! Identity resolution: session id → user/company/LTV.
//!
//! The external identity view is a lookup dependency, never a blocker. A
//! slow or failing fetch degrades to the anonymous identity and the
//! pipeline keeps moving.

pub mod error;
pub mod resolver;
pub mod view;

pub use error::{IdentityError, Result};
pub use resolver::{IdentityResolver, FETCH_TIMEOUT, NEGATIVE_TTL, POSITIVE_TTL};
pub use view::{HttpIdentityView, IdentityView, StaticIdentityView};
