//! Bridge between a cross-platform UI method channel and a native IM SDK.
//!
//! Method calls arrive as a name plus a string-keyed argument map. The
//! [`dispatcher::Dispatcher`] validates the arguments and forwards them to an
//! injected [`sdk::ImSdk`]. Native results and listener callbacks flow back
//! through [`result::Reply`] and [`event::EventEmitter`], both of which post
//! onto a [`thread::MainThread`] before touching the host.

pub mod call;
pub mod config;
pub mod dispatcher;
pub mod error;
pub mod event;
pub mod listener;
pub mod logging;
pub mod result;
pub mod sdk;
pub mod thread;

pub use call::MethodCall;
pub use dispatcher::{Dispatcher, Method};
pub use error::{BridgeError, Result};
pub use event::{BridgeEvent, EventEmitter, EventSink};
pub use result::{MethodResult, Reply};
pub use sdk::{AdvancedMsgListener, BaseCallback, ConnListener, ImSdk};
pub use thread::{DeliveryThread, MainThread, Task};
