use crate::platform::VolumeCapacity;
use crate::service::StorageService;
use serde_json::{Map, Value};
use std::path::Path;

pub type ArgMap = Map<String, Value>;

/// What a method call produced. `NotImplemented` is a first-class reply,
/// not an error: callers probe for optional methods by name.
#[derive(Debug, Clone, PartialEq)]
pub enum MethodOutcome {
    Value(Value),
    NotImplemented,
}

/// Routes method names to storage operations. Every implemented method
/// answers with a value; unknown names answer `NotImplemented`. Nothing
/// here panics or propagates an error to the caller.
pub struct MethodChannel {
    service: StorageService,
}

impl MethodChannel {
    pub fn new(service: StorageService) -> Self {
        Self { service }
    }

    pub fn dispatch(&self, method: &str, args: &ArgMap) -> MethodOutcome {
        log::debug!("dispatch: {method}");
        let value = match method {
            "getPlatformVersion" => Value::from(platform_version()),
            "getFreeDiskSpaceInBytes" => self.capacity_or_zero(|c| c.free),
            "getTotalDiskSpaceInBytes" => self.capacity_or_zero(|c| c.total),
            "storageStats" => {
                serde_json::to_value(self.service.storage_stats()).unwrap_or(Value::Null)
            }
            "clearAllCache" => Value::from(self.service.clear_all_cache().ok()),
            "homeDirectory" => {
                Value::from(self.service.home_directory().to_string_lossy().into_owned())
            }
            "deletePath" => match path_arg(args) {
                Some(path) => Value::from(self.service.delete_path(Path::new(path)).ok()),
                None => Value::Null,
            },
            "pathBytes" => match path_arg(args) {
                Some(path) => Value::from(self.service.path_bytes(Path::new(path))),
                None => Value::Null,
            },
            "pathList" => {
                let listed = self.service.path_list(path_arg(args).map(Path::new));
                Value::from(
                    listed
                        .iter()
                        .map(|p| p.to_string_lossy().into_owned())
                        .collect::<Vec<String>>(),
                )
            }
            _ => return MethodOutcome::NotImplemented,
        };
        MethodOutcome::Value(value)
    }

    fn capacity_or_zero(&self, pick: fn(&VolumeCapacity) -> u64) -> Value {
        match self.service.volume_capacity() {
            Ok(capacity) => Value::from(pick(&capacity)),
            Err(err) => {
                log::warn!("volume capacity probe failed: {err}");
                Value::from(0u64)
            }
        }
    }
}

/// A usable path argument: present, a string, and non-empty.
fn path_arg(args: &ArgMap) -> Option<&str> {
    args.get("path")
        .and_then(Value::as_str)
        .filter(|path| !path.is_empty())
}

fn platform_version() -> String {
    format!("{} {}", std::env::consts::OS, std::env::consts::ARCH)
}
