//! dhlottery-bot - Automated Lotto 6/45 client
//!
//! A client for the dhlottery.co.kr lottery site, which has no official
//! API: it logs in with RSA-encrypted credentials, derives the dynamic
//! tokens the purchase form requires, submits ticket purchases, and reads
//! purchase/winning history — all by scraping HTML and probing the site's
//! undocumented JSON endpoints.
//!
//! # Architecture
//!
//! Three layers, each built on the one below:
//! - [`transport`]: paced, timeout-bounded HTTP with GET retry
//! - [`auth`]: RSA login and session cookie aggregation
//! - [`lotto645`]: purchase submission/classification and winning checks
//!
//! # Examples
//!
//! ```rust,no_run
//! use dhlottery_bot::{AuthManager, Credentials, Lotto645, Settings, Transport};
//! use dhlottery_bot::types::TicketSelection;
//! use std::sync::Arc;
//!
//! # tokio_test::block_on(async {
//! let settings = Arc::new(Settings::from_env()?);
//! let transport = Arc::new(Transport::new(settings.network.clone())?);
//!
//! let mut auth = AuthManager::new(Arc::clone(&transport), Arc::clone(&settings));
//! auth.login(Credentials::new("user_id", "password")).await?;
//!
//! let lotto = Lotto645::new(transport, settings);
//! let outcome = lotto.buy(&mut auth, &TicketSelection::auto(5)).await?;
//! println!("{:?}", outcome);
//! # Ok::<(), dhlottery_bot::Error>(())
//! # });
//! ```

pub mod auth;
pub mod config;
pub mod error;
pub mod lotto645;
pub mod transport;
pub mod types;
pub mod utils;

pub use auth::{AuthManager, Credentials};
pub use config::Settings;
pub use error::{Error, Result};
pub use lotto645::Lotto645;
pub use transport::Transport;
pub use types::{PurchaseOutcome, TicketSelection, WinningCheck};
