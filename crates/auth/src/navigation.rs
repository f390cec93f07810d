//! Role-filtered sidebar entries of the dashboard shell.

use crate::Role;

const ALL: &[Role] = &Role::ALL;
const ADMINS: &[Role] = &[Role::SuperAdmin, Role::WorkshopAdmin];

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct NavEntry {
    pub label: &'static str,
    pub href: &'static str,
    pub roles: &'static [Role],
    /// Active for every path under `href`, not just `href` itself.
    pub match_prefix: bool,
}

impl NavEntry {
    pub fn visible_to(&self, role: Role) -> bool {
        self.roles.contains(&role)
    }

    pub fn is_active(&self, path: &str) -> bool {
        if path == self.href {
            return true;
        }
        self.match_prefix
            && path
                .strip_prefix(self.href)
                .is_some_and(|rest| rest.starts_with('/'))
    }
}

pub const NAV_ENTRIES: &[NavEntry] = &[
    NavEntry { label: "Dashboard", href: "/", roles: ALL, match_prefix: false },
    NavEntry { label: "Super Admin", href: "/superadmin", roles: &[Role::SuperAdmin], match_prefix: true },
    NavEntry { label: "Workshop", href: "/workshop", roles: ADMINS, match_prefix: true },
    NavEntry { label: "Orders", href: "/workshop/orders", roles: ALL, match_prefix: true },
    NavEntry { label: "Mechanics", href: "/workshop/mechanics", roles: ADMINS, match_prefix: true },
    NavEntry { label: "Settings", href: "/settings", roles: ADMINS, match_prefix: true },
];

/// Entries `role` may see, in display order.
pub fn entries_for(role: Role) -> Vec<&'static NavEntry> {
    NAV_ENTRIES.iter().filter(|e| e.visible_to(role)).collect()
}
