//! Navbar state.
//!
//! [`NavState`] decides which of the four element sets are shown for the
//! current session. [`NavbarState`] tracks the menu, dropdowns, profile popup
//! and scroll styling as plain state transitions.

use crate::auth::Session;

/// Scroll offset past which the navbar takes its compact style.
pub const SCROLL_THRESHOLD: f64 = 50.0;
/// Viewports at or below this width use the mobile menu.
pub const MOBILE_BREAKPOINT: u32 = 992;
/// Delay before following a link so the menu close animation can play.
pub const MENU_CLOSE_DELAY_MS: u64 = 400;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ElementSet {
    AuthOnly,
    UserOnly,
    AdminOnly,
    LoggedInOnly,
}

impl ElementSet {
    pub const ALL: [ElementSet; 4] = [
        ElementSet::AuthOnly,
        ElementSet::UserOnly,
        ElementSet::AdminOnly,
        ElementSet::LoggedInOnly,
    ];

    pub fn class_name(&self) -> &'static str {
        match self {
            Self::AuthOnly => "auth-only",
            Self::UserOnly => "user-only",
            Self::AdminOnly => "admin-only",
            Self::LoggedInOnly => "logged-in-only",
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Visibility {
    pub auth_only: bool,
    pub user_only: bool,
    pub admin_only: bool,
    pub logged_in_only: bool,
}

impl Visibility {
    pub fn is_shown(&self, set: ElementSet) -> bool {
        match set {
            ElementSet::AuthOnly => self.auth_only,
            ElementSet::UserOnly => self.user_only,
            ElementSet::AdminOnly => self.admin_only,
            ElementSet::LoggedInOnly => self.logged_in_only,
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum NavState {
    LoggedOut,
    LoggedInUser,
    LoggedInAdmin,
}

impl NavState {
    /// Admin is decided by the session role.
    pub fn from_session(session: Option<&Session>) -> Self {
        match session {
            None => Self::LoggedOut,
            Some(s) if s.is_admin() => Self::LoggedInAdmin,
            Some(_) => Self::LoggedInUser,
        }
    }

    pub fn visibility(&self) -> Visibility {
        match self {
            Self::LoggedOut => Visibility {
                auth_only: true,
                user_only: false,
                admin_only: false,
                logged_in_only: false,
            },
            Self::LoggedInUser => Visibility {
                auth_only: false,
                user_only: true,
                admin_only: false,
                logged_in_only: true,
            },
            Self::LoggedInAdmin => Visibility {
                auth_only: false,
                user_only: false,
                admin_only: true,
                logged_in_only: true,
            },
        }
    }

    pub fn as_str(&self) -> &'static str {
        match self {
            Self::LoggedOut => "logged out",
            Self::LoggedInUser => "user",
            Self::LoggedInAdmin => "admin",
        }
    }
}

/// What activating a menu link should do.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum LinkAction {
    /// A `#` dropdown trigger; the menu stays open.
    ToggledDropdown,
    /// In-page anchor.
    Anchor(String),
    /// Follow the link after `delay_ms`.
    Navigate { href: String, delay_ms: u64 },
}

#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct NavbarState {
    pub scrolled: bool,
    pub menu_open: bool,
    pub profile_open: bool,
    open_dropdowns: Vec<String>,
}

impl NavbarState {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn on_scroll(&mut self, offset: f64) {
        self.scrolled = offset > SCROLL_THRESHOLD;
    }

    /// Page body scrolling is locked while the mobile menu is open.
    pub fn body_locked(&self) -> bool {
        self.menu_open
    }

    /// Returns true when the menu was opened (the menu should scroll to top).
    pub fn toggle_menu(&mut self) -> bool {
        self.menu_open = !self.menu_open;
        self.menu_open
    }

    pub fn is_dropdown_open(&self, name: &str) -> bool {
        self.open_dropdowns.iter().any(|d| d == name)
    }

    fn toggle_dropdown(&mut self, name: &str) {
        if let Some(pos) = self.open_dropdowns.iter().position(|d| d == name) {
            self.open_dropdowns.remove(pos);
        } else {
            self.open_dropdowns.push(name.to_string());
        }
    }

    fn close_menu(&mut self) {
        self.menu_open = false;
        self.open_dropdowns.clear();
    }

    /// Handle a click on a menu link. `dropdown` names the dropdown the link
    /// belongs to, if any.
    pub fn activate_link(&mut self, href: &str, dropdown: Option<&str>, viewport_width: u32) -> LinkAction {
        if let Some(name) = dropdown {
            if href == "#" {
                self.toggle_dropdown(name);
                return LinkAction::ToggledDropdown;
            }
        }

        self.close_menu();
        if href.starts_with('#') {
            return LinkAction::Anchor(href.to_string());
        }

        let delay_ms = if viewport_width <= MOBILE_BREAKPOINT && !href.is_empty() {
            MENU_CLOSE_DELAY_MS
        } else {
            0
        };
        LinkAction::Navigate {
            href: href.to_string(),
            delay_ms,
        }
    }

    pub fn toggle_profile(&mut self) {
        self.profile_open = !self.profile_open;
    }

    /// A click anywhere outside the profile popup closes it.
    pub fn click_outside_profile(&mut self) {
        self.profile_open = false;
    }

    /// Page-load reset: every menu and popup closed.
    pub fn reset(&mut self) {
        self.close_menu();
        self.profile_open = false;
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::auth::Role;
    use chrono::Utc;

    fn session(role: Role, email: &str) -> Session {
        Session {
            id: "id".to_string(),
            email: email.to_string(),
            name: "N".to_string(),
            role,
            login_time: Utc::now(),
        }
    }

    #[test]
    fn test_logged_out_visibility() {
        let vis = NavState::from_session(None).visibility();
        assert!(vis.is_shown(ElementSet::AuthOnly));
        assert!(!vis.is_shown(ElementSet::UserOnly));
        assert!(!vis.is_shown(ElementSet::AdminOnly));
        assert!(!vis.is_shown(ElementSet::LoggedInOnly));
    }

    #[test]
    fn test_user_visibility() {
        let s = session(Role::User, "reader@example.com");
        let state = NavState::from_session(Some(&s));
        assert_eq!(state, NavState::LoggedInUser);
        let vis = state.visibility();
        assert!(!vis.auth_only);
        assert!(vis.user_only);
        assert!(!vis.admin_only);
        assert!(vis.logged_in_only);
    }

    #[test]
    fn test_admin_decided_by_role_not_email() {
        let s = session(Role::Admin, "editor@example.com");
        assert_eq!(NavState::from_session(Some(&s)), NavState::LoggedInAdmin);

        let s = session(Role::User, "admin@gmail.com");
        assert_eq!(NavState::from_session(Some(&s)), NavState::LoggedInUser);
    }

    #[test]
    fn test_scroll_threshold() {
        let mut nav = NavbarState::new();
        nav.on_scroll(50.0);
        assert!(!nav.scrolled);
        nav.on_scroll(50.5);
        assert!(nav.scrolled);
        nav.on_scroll(0.0);
        assert!(!nav.scrolled);
    }

    #[test]
    fn test_menu_toggle_locks_body() {
        let mut nav = NavbarState::new();
        assert!(nav.toggle_menu());
        assert!(nav.body_locked());
        assert!(!nav.toggle_menu());
        assert!(!nav.body_locked());
    }

    #[test]
    fn test_dropdown_trigger_keeps_menu_open() {
        let mut nav = NavbarState::new();
        nav.toggle_menu();
        let action = nav.activate_link("#", Some("categories"), 400);
        assert_eq!(action, LinkAction::ToggledDropdown);
        assert!(nav.menu_open);
        assert!(nav.is_dropdown_open("categories"));

        nav.activate_link("#", Some("categories"), 400);
        assert!(!nav.is_dropdown_open("categories"));
    }

    #[test]
    fn test_mobile_link_closes_then_navigates_late() {
        let mut nav = NavbarState::new();
        nav.toggle_menu();
        nav.activate_link("#", Some("categories"), 400);

        let action = nav.activate_link("blog.html", Some("categories"), 400);
        assert_eq!(
            action,
            LinkAction::Navigate {
                href: "blog.html".to_string(),
                delay_ms: MENU_CLOSE_DELAY_MS
            }
        );
        assert!(!nav.menu_open);
        assert!(!nav.is_dropdown_open("categories"));
    }

    #[test]
    fn test_desktop_link_navigates_immediately() {
        let mut nav = NavbarState::new();
        let action = nav.activate_link("about.html", None, 1280);
        assert_eq!(
            action,
            LinkAction::Navigate {
                href: "about.html".to_string(),
                delay_ms: 0
            }
        );
    }

    #[test]
    fn test_anchor_link() {
        let mut nav = NavbarState::new();
        nav.toggle_menu();
        let action = nav.activate_link("#latest", None, 400);
        assert_eq!(action, LinkAction::Anchor("#latest".to_string()));
        assert!(!nav.menu_open);
    }

    #[test]
    fn test_profile_popup_and_reset() {
        let mut nav = NavbarState::new();
        nav.toggle_profile();
        assert!(nav.profile_open);
        nav.click_outside_profile();
        assert!(!nav.profile_open);

        nav.toggle_profile();
        nav.toggle_menu();
        nav.reset();
        assert_eq!(nav, NavbarState::default());
    }
}
