//! Method dispatcher: one UI call in, at most one native call out.

use std::fmt;
use std::str::FromStr;
use std::sync::Arc;

use serde_json::Value;

use crate::call::MethodCall;
use crate::error::{BridgeError, Result};
use crate::event::{EventEmitter, EventSink};
use crate::listener::{AdvancedMsgListenerImpl, ConnListenerImpl};
use crate::result::{BaseListener, MethodResult, Reply};
use crate::sdk::ImSdk;
use crate::thread::MainThread;

/// Methods the bridge understands, by their channel name.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Method {
    InitSdk,
    Login,
    Logout,
    GetLoginStatus,
    GetLoginUid,
    SetAdvancedMsgListener,
    ForceReConn,
}

impl Method {
    pub const ALL: [Method; 7] = [
        Method::InitSdk,
        Method::Login,
        Method::Logout,
        Method::GetLoginStatus,
        Method::GetLoginUid,
        Method::SetAdvancedMsgListener,
        Method::ForceReConn,
    ];

    pub fn as_str(self) -> &'static str {
        match self {
            Method::InitSdk => "initSDK",
            Method::Login => "login",
            Method::Logout => "logout",
            Method::GetLoginStatus => "getLoginStatus",
            Method::GetLoginUid => "getLoginUid",
            Method::SetAdvancedMsgListener => "setAdvancedMsgListener",
            Method::ForceReConn => "forceReConn",
        }
    }
}

impl FromStr for Method {
    type Err = BridgeError;

    fn from_str(s: &str) -> Result<Self> {
        Method::ALL
            .into_iter()
            .find(|m| m.as_str() == s)
            .ok_or_else(|| BridgeError::UnknownMethod(s.to_string()))
    }
}

impl fmt::Display for Method {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Validated arguments for one call. Built before the SDK is touched, so a
/// bad argument map never reaches native code.
#[derive(Debug, Clone, PartialEq)]
enum Request {
    InitSdk { operation_id: String, config: String },
    Login { operation_id: String, uid: String, token: String },
    Logout { operation_id: String },
    GetLoginStatus,
    GetLoginUid,
    SetAdvancedMsgListener { id: String },
    ForceReConn,
}

impl Request {
    fn parse(method: Method, call: &MethodCall) -> Result<Self> {
        Ok(match method {
            Method::InitSdk => {
                let operation_id = call.operation_id()?.to_string();
                // Older callers send the config fields inline instead of under `config`.
                let config = if call.has("config") {
                    call.json_value("config")?
                } else {
                    call.arguments_json()
                };
                Request::InitSdk { operation_id, config }
            }
            Method::Login => Request::Login {
                operation_id: call.operation_id()?.to_string(),
                uid: call.value("uid")?.to_string(),
                token: call.value("token")?.to_string(),
            },
            Method::Logout => Request::Logout {
                operation_id: call.operation_id()?.to_string(),
            },
            Method::GetLoginStatus => Request::GetLoginStatus,
            Method::GetLoginUid => Request::GetLoginUid,
            Method::SetAdvancedMsgListener => Request::SetAdvancedMsgListener {
                id: call.value("id")?.to_string(),
            },
            Method::ForceReConn => Request::ForceReConn,
        })
    }
}

/// Routes method calls into an injected [`ImSdk`].
pub struct Dispatcher {
    sdk: Arc<dyn ImSdk>,
    main: Arc<dyn MainThread>,
    emitter: EventEmitter,
}

impl Dispatcher {
    pub fn new(sdk: Arc<dyn ImSdk>, main: Arc<dyn MainThread>, events: Arc<dyn EventSink>) -> Self {
        let emitter = EventEmitter::new(events, Arc::clone(&main));
        Self { sdk, main, emitter }
    }

    pub fn emitter(&self) -> &EventEmitter {
        &self.emitter
    }

    /// Handle one call. The reply is always delivered on the delivery
    /// thread, exactly once.
    pub fn handle(&self, call: MethodCall, result: Box<dyn MethodResult>) {
        let reply = Reply::new(call.method.clone(), result, Arc::clone(&self.main));

        let method = match call.method.parse::<Method>() {
            Ok(m) => m,
            Err(_) => {
                tracing::warn!(method = %call.method, "unknown method");
                reply.not_implemented();
                return;
            }
        };

        let request = match Request::parse(method, &call) {
            Ok(r) => r,
            Err(e) => {
                tracing::warn!(%method, error = %e, "rejected call");
                reply.error(e);
                return;
            }
        };

        tracing::debug!(%method, "dispatch");
        self.forward(request, reply);
    }

    fn forward(&self, request: Request, reply: Reply) {
        match request {
            Request::InitSdk { operation_id, config } => {
                let listener = Arc::new(ConnListenerImpl::new(self.emitter.clone()));
                let ok = self.sdk.init_sdk(listener, &operation_id, &config);
                reply.value(ok);
            }
            Request::Login { operation_id, uid, token } => {
                self.sdk
                    .login(Box::new(BaseListener::new(reply)), &operation_id, &uid, &token);
            }
            Request::Logout { operation_id } => {
                self.sdk.logout(Box::new(BaseListener::new(reply)), &operation_id);
            }
            Request::GetLoginStatus => {
                reply.value(self.sdk.get_login_status());
            }
            Request::GetLoginUid => {
                reply.value(self.sdk.get_login_uid());
            }
            Request::SetAdvancedMsgListener { id } => {
                let listener = Arc::new(AdvancedMsgListenerImpl::new(id, self.emitter.clone()));
                self.sdk.set_advanced_msg_listener(listener);
                reply.success(Value::Null);
            }
            Request::ForceReConn => {
                self.sdk.force_reconnect();
                reply.success(Value::Null);
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    fn call(method: &str, args: Value) -> MethodCall {
        match args {
            Value::Object(map) => MethodCall::new(method, map),
            _ => panic!("test args must be an object"),
        }
    }

    #[test]
    fn test_method_names_round_trip() {
        for m in Method::ALL {
            assert_eq!(m.as_str().parse::<Method>().unwrap(), m);
        }
        assert!("initSdk".parse::<Method>().is_err());
        assert!("".parse::<Method>().is_err());
    }

    #[test]
    fn test_parse_login() {
        let c = call("login", json!({"operationID": "1", "uid": "u1", "token": "t1"}));
        assert_eq!(
            Request::parse(Method::Login, &c).unwrap(),
            Request::Login {
                operation_id: "1".into(),
                uid: "u1".into(),
                token: "t1".into(),
            }
        );
    }

    #[test]
    fn test_parse_login_missing_token() {
        let c = call("login", json!({"operationID": "1", "uid": "u1"}));
        assert!(matches!(
            Request::parse(Method::Login, &c),
            Err(BridgeError::MissingArgument(ref k)) if k == "token"
        ));
    }

    #[test]
    fn test_parse_init_sdk_config_forms() {
        let nested = call(
            "initSDK",
            json!({"operationID": "op", "config": {"platform": 2, "ws_addr": "ws://h:10001"}}),
        );
        let Request::InitSdk { config, .. } = Request::parse(Method::InitSdk, &nested).unwrap() else {
            panic!("expected InitSdk");
        };
        let config: Value = serde_json::from_str(&config).unwrap();
        assert_eq!(config, json!({"platform": 2, "ws_addr": "ws://h:10001"}));

        let inline = call("initSDK", json!({"operationID": "op", "platform": 2}));
        let Request::InitSdk { config, .. } = Request::parse(Method::InitSdk, &inline).unwrap() else {
            panic!("expected InitSdk");
        };
        let config: Value = serde_json::from_str(&config).unwrap();
        assert_eq!(config["platform"], 2);
        assert_eq!(config["operationID"], "op");
    }

    #[test]
    fn test_parse_no_field_methods() {
        let empty = call("getLoginStatus", json!({}));
        assert_eq!(
            Request::parse(Method::GetLoginStatus, &empty).unwrap(),
            Request::GetLoginStatus
        );
        assert_eq!(
            Request::parse(Method::ForceReConn, &empty).unwrap(),
            Request::ForceReConn
        );
        assert!(Request::parse(Method::SetAdvancedMsgListener, &empty).is_err());
    }
}
