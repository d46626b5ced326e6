use std::collections::BTreeMap;

use serde::{Deserialize, Serialize};

#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
pub struct UserId(pub String);

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum Role {
    Manager,
    #[serde(rename = "PM Staff")]
    PmStaff,
    #[serde(rename = "Leasing Staff")]
    LeasingStaff,
}

impl Role {
    pub const fn label(self) -> &'static str {
        match self {
            Role::Manager => "Manager",
            Role::PmStaff => "PM Staff",
            Role::LeasingStaff => "Leasing Staff",
        }
    }
}

/// Named permission flags consulted before privileged pipeline actions.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
pub struct Permissions {
    #[serde(default)]
    pub approve_owner_leads: bool,
    #[serde(default)]
    pub approve_owner_onboarding: bool,
    #[serde(default)]
    pub manage_forms: bool,
    #[serde(default)]
    pub view_analytics: bool,
    #[serde(default)]
    pub create_leads: bool,
}

impl Permissions {
    pub const fn for_role(role: Role) -> Self {
        match role {
            Role::Manager => Self {
                approve_owner_leads: true,
                approve_owner_onboarding: true,
                manage_forms: true,
                view_analytics: true,
                create_leads: true,
            },
            Role::PmStaff => Self {
                approve_owner_leads: false,
                approve_owner_onboarding: false,
                manage_forms: false,
                view_analytics: true,
                create_leads: true,
            },
            Role::LeasingStaff => Self {
                approve_owner_leads: false,
                approve_owner_onboarding: false,
                manage_forms: false,
                view_analytics: false,
                create_leads: true,
            },
        }
    }

    pub fn allows(&self, permission: Permission) -> bool {
        match permission {
            Permission::ApproveOwnerLeads => self.approve_owner_leads,
            Permission::ApproveOwnerOnboarding => self.approve_owner_onboarding,
            Permission::ManageForms => self.manage_forms,
            Permission::ViewAnalytics => self.view_analytics,
            Permission::CreateLeads => self.create_leads,
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub enum Permission {
    ApproveOwnerLeads,
    ApproveOwnerOnboarding,
    ManageForms,
    ViewAnalytics,
    CreateLeads,
}

impl Permission {
    pub const fn label(self) -> &'static str {
        match self {
            Permission::ApproveOwnerLeads => "approveOwnerLeads",
            Permission::ApproveOwnerOnboarding => "approveOwnerOnboarding",
            Permission::ManageForms => "manageForms",
            Permission::ViewAnalytics => "viewAnalytics",
            Permission::CreateLeads => "createLeads",
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct User {
    pub id: UserId,
    pub name: String,
    pub role: Role,
    pub permissions: Permissions,
}

impl User {
    pub fn new(id: impl Into<String>, name: impl Into<String>, role: Role) -> Self {
        Self {
            id: UserId(id.into()),
            name: name.into(),
            role,
            permissions: Permissions::for_role(role),
        }
    }

    /// Actor recorded for submissions arriving through the public intake form.
    pub fn intake_system() -> Self {
        let mut user = Self::new("system-intake", "Online Application", Role::LeasingStaff);
        user.permissions = Permissions {
            create_leads: true,
            ..Permissions::default()
        };
        user
    }

    pub fn can(&self, permission: Permission) -> bool {
        self.permissions.allows(permission)
    }
}

/// Known staff accounts keyed by id.
#[derive(Debug, Clone, Default)]
pub struct UserDirectory {
    users: BTreeMap<UserId, User>,
}

impl UserDirectory {
    pub fn new(users: impl IntoIterator<Item = User>) -> Self {
        Self {
            users: users.into_iter().map(|user| (user.id.clone(), user)).collect(),
        }
    }

    pub fn get(&self, id: &UserId) -> Option<&User> {
        self.users.get(id)
    }

    pub fn users(&self) -> impl Iterator<Item = &User> {
        self.users.values()
    }
}
