//! Route handlers, one module per area.
//!
//! | Area | Module |
//! |------|--------|
//! | `/auth/*` | [`account`] |
//! | `/profile*`, `/avatars/*` | [`profile`] |
//! | `/feed*` | [`feed`] |
//! | `/matches*` | [`matches`] |

pub mod account;
pub mod feed;
pub mod matches;
pub mod profile;
