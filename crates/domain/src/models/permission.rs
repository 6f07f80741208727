//! Permission model: resources, actions and the canonical capability matrix.
//!
//! Stored permission documents come in two shapes: a flat object of
//! `canX` booleans and a list of `{resource, actions}` entries. Both are
//! normalised here into [`PermissionPatch`] and never inspected again.

use serde::{Deserialize, Serialize, Serializer};
use serde_json::{Map, Value as JsonValue};
use std::collections::{BTreeMap, BTreeSet};
use std::str::FromStr;

/// Resources that permissions are scoped to.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Resource {
    Dashboard,
    Trucks,
    Maintenance,
    Mechanics,
    Reports,
    Users,
    Settings,
    Admin,
}

impl Resource {
    /// Get all resources.
    pub fn all() -> &'static [Resource] {
        &[
            Resource::Dashboard,
            Resource::Trucks,
            Resource::Maintenance,
            Resource::Mechanics,
            Resource::Reports,
            Resource::Users,
            Resource::Settings,
            Resource::Admin,
        ]
    }

    pub fn as_str(&self) -> &'static str {
        match self {
            Resource::Dashboard => "dashboard",
            Resource::Trucks => "trucks",
            Resource::Maintenance => "maintenance",
            Resource::Mechanics => "mechanics",
            Resource::Reports => "reports",
            Resource::Users => "users",
            Resource::Settings => "settings",
            Resource::Admin => "admin",
        }
    }
}

impl FromStr for Resource {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        Resource::all()
            .iter()
            .copied()
            .find(|r| r.as_str() == s)
            .ok_or_else(|| format!("Unknown resource: {}", s))
    }
}

impl std::fmt::Display for Resource {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Operation classes evaluated against a resource.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Action {
    Read,
    Create,
    Update,
    Delete,
}

impl FromStr for Action {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "read" => Ok(Action::Read),
            "create" => Ok(Action::Create),
            "update" => Ok(Action::Update),
            "delete" => Ok(Action::Delete),
            _ => Err(format!("Unknown action: {}", s)),
        }
    }
}

impl std::fmt::Display for Action {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Action::Read => write!(f, "read"),
            Action::Create => write!(f, "create"),
            Action::Update => write!(f, "update"),
            Action::Delete => write!(f, "delete"),
        }
    }
}

/// One boolean flag of the permission matrix.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub enum Capability {
    ViewDashboard,
    ViewTrucks,
    AddTrucks,
    EditTrucks,
    DeleteTrucks,
    ViewMaintenance,
    AddMaintenance,
    EditMaintenance,
    DeleteMaintenance,
    ViewMechanics,
    AddMechanics,
    EditMechanics,
    DeleteMechanics,
    ViewReports,
    ViewUsers,
    ManageUsers,
    ViewSettings,
    ManageSettings,
    ViewAdmin,
    ManageAdmin,
}

impl Capability {
    /// Every flag, in the order clients expect them.
    pub const ALL: [Capability; 20] = [
        Capability::ViewDashboard,
        Capability::ViewTrucks,
        Capability::AddTrucks,
        Capability::EditTrucks,
        Capability::DeleteTrucks,
        Capability::ViewMaintenance,
        Capability::AddMaintenance,
        Capability::EditMaintenance,
        Capability::DeleteMaintenance,
        Capability::ViewMechanics,
        Capability::AddMechanics,
        Capability::EditMechanics,
        Capability::DeleteMechanics,
        Capability::ViewReports,
        Capability::ViewUsers,
        Capability::ManageUsers,
        Capability::ViewSettings,
        Capability::ManageSettings,
        Capability::ViewAdmin,
        Capability::ManageAdmin,
    ];

    /// Key used in the flat JSON representation.
    pub fn key(&self) -> &'static str {
        match self {
            Capability::ViewDashboard => "canViewDashboard",
            Capability::ViewTrucks => "canViewTrucks",
            Capability::AddTrucks => "canAddTrucks",
            Capability::EditTrucks => "canEditTrucks",
            Capability::DeleteTrucks => "canDeleteTrucks",
            Capability::ViewMaintenance => "canViewMaintenance",
            Capability::AddMaintenance => "canAddMaintenance",
            Capability::EditMaintenance => "canEditMaintenance",
            Capability::DeleteMaintenance => "canDeleteMaintenance",
            Capability::ViewMechanics => "canViewMechanics",
            Capability::AddMechanics => "canAddMechanics",
            Capability::EditMechanics => "canEditMechanics",
            Capability::DeleteMechanics => "canDeleteMechanics",
            Capability::ViewReports => "canViewReports",
            Capability::ViewUsers => "canViewUsers",
            Capability::ManageUsers => "canManageUsers",
            Capability::ViewSettings => "canViewSettings",
            Capability::ManageSettings => "canManageSettings",
            Capability::ViewAdmin => "canViewAdmin",
            Capability::ManageAdmin => "canManageAdmin",
        }
    }

    pub fn from_key(key: &str) -> Option<Capability> {
        Capability::ALL.iter().copied().find(|c| c.key() == key)
    }

    /// The resource this flag belongs to.
    pub fn resource(&self) -> Resource {
        match self {
            Capability::ViewDashboard => Resource::Dashboard,
            Capability::ViewTrucks
            | Capability::AddTrucks
            | Capability::EditTrucks
            | Capability::DeleteTrucks => Resource::Trucks,
            Capability::ViewMaintenance
            | Capability::AddMaintenance
            | Capability::EditMaintenance
            | Capability::DeleteMaintenance => Resource::Maintenance,
            Capability::ViewMechanics
            | Capability::AddMechanics
            | Capability::EditMechanics
            | Capability::DeleteMechanics => Resource::Mechanics,
            Capability::ViewReports => Resource::Reports,
            Capability::ViewUsers | Capability::ManageUsers => Resource::Users,
            Capability::ViewSettings | Capability::ManageSettings => Resource::Settings,
            Capability::ViewAdmin | Capability::ManageAdmin => Resource::Admin,
        }
    }

    /// The flag that governs `action` on `resource`, if that pair is modelled.
    pub fn governing(resource: Resource, action: Action) -> Option<Capability> {
        use Action::*;
        use Resource::*;

        let cap = match (resource, action) {
            (Dashboard, Read) => Capability::ViewDashboard,
            (Trucks, Read) => Capability::ViewTrucks,
            (Trucks, Create) => Capability::AddTrucks,
            (Trucks, Update) => Capability::EditTrucks,
            (Trucks, Delete) => Capability::DeleteTrucks,
            (Maintenance, Read) => Capability::ViewMaintenance,
            (Maintenance, Create) => Capability::AddMaintenance,
            (Maintenance, Update) => Capability::EditMaintenance,
            (Maintenance, Delete) => Capability::DeleteMaintenance,
            (Mechanics, Read) => Capability::ViewMechanics,
            (Mechanics, Create) => Capability::AddMechanics,
            (Mechanics, Update) => Capability::EditMechanics,
            (Mechanics, Delete) => Capability::DeleteMechanics,
            (Reports, Read) => Capability::ViewReports,
            (Users, Read) => Capability::ViewUsers,
            (Users, Create | Update | Delete) => Capability::ManageUsers,
            (Settings, Read) => Capability::ViewSettings,
            (Settings, Update) => Capability::ManageSettings,
            (Admin, Read) => Capability::ViewAdmin,
            (Admin, Update) => Capability::ManageAdmin,
            _ => return None,
        };
        Some(cap)
    }

    /// All flags belonging to `resource`.
    pub fn for_resource(resource: Resource) -> impl Iterator<Item = Capability> {
        Capability::ALL
            .into_iter()
            .filter(move |c| c.resource() == resource)
    }
}

impl std::fmt::Display for Capability {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.key())
    }
}

/// A complete permission matrix: every capability not in the set is denied.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct PermissionSet(BTreeSet<Capability>);

impl PermissionSet {
    pub fn empty() -> Self {
        Self::default()
    }

    pub fn all() -> Self {
        Capability::ALL.into_iter().collect()
    }

    pub fn contains(&self, capability: Capability) -> bool {
        self.0.contains(&capability)
    }

    pub fn len(&self) -> usize {
        self.0.len()
    }

    pub fn is_empty(&self) -> bool {
        self.0.is_empty()
    }

    pub fn set(&mut self, capability: Capability, granted: bool) {
        if granted {
            self.0.insert(capability);
        } else {
            self.0.remove(&capability);
        }
    }

    pub fn iter(&self) -> impl Iterator<Item = Capability> + '_ {
        self.0.iter().copied()
    }

    /// Whether `action` on `resource` is granted. Unmodelled pairs are denied.
    pub fn allows(&self, resource: Resource, action: Action) -> bool {
        Capability::governing(resource, action).is_some_and(|c| self.contains(c))
    }

    /// Layers a partial patch on top of this matrix.
    pub fn patched(&self, patch: &PermissionPatch) -> PermissionSet {
        let mut result = self.clone();
        for (capability, granted) in patch.iter() {
            result.set(capability, granted);
        }
        result
    }

    /// Renders all twenty flags as a flat JSON object.
    pub fn to_flags(&self) -> Map<String, JsonValue> {
        Capability::ALL
            .iter()
            .map(|c| (c.key().to_string(), JsonValue::Bool(self.contains(*c))))
            .collect()
    }
}

impl FromIterator<Capability> for PermissionSet {
    fn from_iter<I: IntoIterator<Item = Capability>>(iter: I) -> Self {
        Self(iter.into_iter().collect())
    }
}

impl Serialize for PermissionSet {
    fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        self.to_flags().serialize(serializer)
    }
}

/// A partial permission matrix. Capabilities absent from the patch are
/// unspecified and fall through to whatever the patch is layered on.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct PermissionPatch(BTreeMap<Capability, bool>);

/// One entry of the list-shaped document.
#[derive(Debug, Deserialize)]
struct ResourceEntry {
    resource: String,
    actions: Vec<String>,
}

impl PermissionPatch {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with(mut self, capability: Capability, granted: bool) -> Self {
        self.0.insert(capability, granted);
        self
    }

    pub fn get(&self, capability: Capability) -> Option<bool> {
        self.0.get(&capability).copied()
    }

    pub fn is_empty(&self) -> bool {
        self.0.is_empty()
    }

    pub fn iter(&self) -> impl Iterator<Item = (Capability, bool)> + '_ {
        self.0.iter().map(|(c, g)| (*c, *g))
    }

    /// Treats the patch as a complete matrix: unspecified flags are denied.
    pub fn to_replacement(&self) -> PermissionSet {
        self.iter().filter(|(_, g)| *g).map(|(c, _)| c).collect()
    }

    /// Normalises a stored permission document of either shape.
    ///
    /// Returns `None` when the value is neither a flag object nor a list of
    /// well-formed `{resource, actions}` entries.
    pub fn from_document(value: &JsonValue) -> Option<Self> {
        match value {
            JsonValue::Object(flags) => Some(Self::from_flags(flags)),
            JsonValue::Array(entries) => Self::from_entries(entries),
            _ => None,
        }
    }

    /// Flat shape: recognised keys with boolean values are explicit, anything
    /// else is ignored.
    fn from_flags(flags: &Map<String, JsonValue>) -> Self {
        let mut patch = Self::new();
        for (key, value) in flags {
            match (Capability::from_key(key), value.as_bool()) {
                (Some(capability), Some(granted)) => {
                    patch.0.insert(capability, granted);
                }
                _ => tracing::debug!(key = %key, "Ignoring unrecognised permission flag"),
            }
        }
        patch
    }

    /// List shape: every flag of a listed resource becomes explicit, granted
    /// only when one of its actions is listed. Resources that are not listed
    /// stay unspecified.
    fn from_entries(entries: &[JsonValue]) -> Option<Self> {
        let mut listed: BTreeMap<Resource, BTreeSet<Capability>> = BTreeMap::new();

        for entry in entries {
            let entry: ResourceEntry = serde_json::from_value(entry.clone()).ok()?;
            let Ok(resource) = entry.resource.parse::<Resource>() else {
                tracing::debug!(resource = %entry.resource, "Ignoring unknown permission resource");
                continue;
            };
            let granted = listed.entry(resource).or_default();
            granted.extend(
                entry
                    .actions
                    .iter()
                    .filter_map(|a| a.parse::<Action>().ok())
                    .filter_map(|a| Capability::governing(resource, a)),
            );
        }

        let mut patch = Self::new();
        for (resource, granted) in listed {
            for capability in Capability::for_resource(resource) {
                patch.0.insert(capability, granted.contains(&capability));
            }
        }
        Some(patch)
    }
}

impl FromIterator<(Capability, bool)> for PermissionPatch {
    fn from_iter<I: IntoIterator<Item = (Capability, bool)>>(iter: I) -> Self {
        Self(iter.into_iter().collect())
    }
}

impl Serialize for PermissionPatch {
    fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        let flags: BTreeMap<&'static str, bool> =
            self.0.iter().map(|(c, g)| (c.key(), *g)).collect();
        flags.serialize(serializer)
    }
}
