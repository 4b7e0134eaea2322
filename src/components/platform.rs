// Seams to the embedding host and the platform notification surface
// Implemented by the host integration; tests substitute recording fakes.

use std::collections::HashMap;
use std::path::PathBuf;

use serde::{Deserialize, Serialize};
use serde_json::Value;

use super::content::BuiltNotification;
use super::localization::format_template;
use super::payload::CanonicalMessage;
use super::{NotId, PushResult};

/// Opaque platform resource handle (drawable / mipmap id)
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct ResourceId(pub u32);

/// Resource namespaces searched for icons, in lookup order
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum ResourceNamespace {
    Drawable,
    Mipmap,
}

impl ResourceNamespace {
    pub const LOOKUP_ORDER: [ResourceNamespace; 2] =
        [ResourceNamespace::Drawable, ResourceNamespace::Mipmap];

    pub fn name(&self) -> &'static str {
        match self {
            ResourceNamespace::Drawable => "drawable",
            ResourceNamespace::Mipmap => "mipmap",
        }
    }
}

/// The host application's event channel
pub trait HostBridge: Send + Sync {
    fn is_attached(&self) -> bool;

    /// Hand one message (in host JSON shape) to the host. An error keeps the message
    /// buffered.
    ///
    /// Called while the delivery queue lock is held. Implementations must not call back
    /// into `PushService` or the queue from here; post the message and return.
    fn deliver(&self, message: &Value) -> PushResult<()>;
}

/// Platform notification tray
pub trait NotificationSurface: Send + Sync {
    fn render(&self, id: NotId, notification: &BuiltNotification);
    fn cancel(&self, id: NotId);
    fn cancel_all(&self);
}

/// Application resources: icons, localized strings, bundled assets
pub trait ResourceResolver: Send + Sync {
    fn resolve_resource(&self, namespace: ResourceNamespace, name: &str) -> Option<ResourceId>;

    /// Look up a string resource and format it with `args`
    fn localized_string(&self, key: &str, args: &[String]) -> Option<String>;

    /// Path of a file bundled with the application
    fn asset_path(&self, name: &str) -> Option<PathBuf>;

    fn application_icon(&self) -> ResourceId;

    fn app_name(&self) -> String;

    fn package_name(&self) -> String;

    /// Drawable lookup falling back to the mipmap namespace
    fn resolve_drawable(&self, name: &str) -> Option<ResourceId> {
        ResourceNamespace::LOOKUP_ORDER
            .iter()
            .find_map(|ns| self.resolve_resource(*ns, name))
    }
}

/// Application icon badge counter
pub trait BadgeSink: Send + Sync {
    fn set_badge(&self, count: u32);
}

/// Starts the host application without bringing it to the foreground
pub trait HostLauncher: Send + Sync {
    fn launch_in_background(&self, message: &CanonicalMessage);
}

/// In-memory resource table for hosts that ship their resources as data
#[derive(Debug, Clone)]
pub struct StaticResources {
    resources: HashMap<(ResourceNamespace, String), ResourceId>,
    strings: HashMap<String, String>,
    assets: HashMap<String, PathBuf>,
    application_icon: ResourceId,
    app_name: String,
    package_name: String,
}

impl StaticResources {
    pub fn new(
        app_name: impl Into<String>,
        package_name: impl Into<String>,
        application_icon: ResourceId,
    ) -> Self {
        Self {
            resources: HashMap::new(),
            strings: HashMap::new(),
            assets: HashMap::new(),
            application_icon,
            app_name: app_name.into(),
            package_name: package_name.into(),
        }
    }

    pub fn with_resource(
        mut self,
        namespace: ResourceNamespace,
        name: impl Into<String>,
        id: ResourceId,
    ) -> Self {
        self.resources.insert((namespace, name.into()), id);
        self
    }

    pub fn with_drawable(self, name: impl Into<String>, id: u32) -> Self {
        self.with_resource(ResourceNamespace::Drawable, name, ResourceId(id))
    }

    pub fn with_mipmap(self, name: impl Into<String>, id: u32) -> Self {
        self.with_resource(ResourceNamespace::Mipmap, name, ResourceId(id))
    }

    /// Register a string template; `%s`, `%d` and `%1$s` placeholders are filled from
    /// `loc-data`
    pub fn with_string(mut self, key: impl Into<String>, template: impl Into<String>) -> Self {
        self.strings.insert(key.into(), template.into());
        self
    }

    pub fn with_asset(mut self, name: impl Into<String>, path: impl Into<PathBuf>) -> Self {
        self.assets.insert(name.into(), path.into());
        self
    }
}

impl ResourceResolver for StaticResources {
    fn resolve_resource(&self, namespace: ResourceNamespace, name: &str) -> Option<ResourceId> {
        self.resources.get(&(namespace, name.to_string())).copied()
    }

    fn localized_string(&self, key: &str, args: &[String]) -> Option<String> {
        self.strings
            .get(key)
            .map(|template| format_template(template, args))
    }

    fn asset_path(&self, name: &str) -> Option<PathBuf> {
        self.assets.get(name).cloned()
    }

    fn application_icon(&self) -> ResourceId {
        self.application_icon
    }

    fn app_name(&self) -> String {
        self.app_name.clone()
    }

    fn package_name(&self) -> String {
        self.package_name.clone()
    }
}
