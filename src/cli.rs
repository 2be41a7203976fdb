use crate::Args;
use anyhow::Result;
use chrono::Utc;
use masthead::auth::{Guard, NewAccount};
use masthead::catalog::{self, ALL_CATEGORIES};
use masthead::config;
use masthead::nav::{ElementSet, LinkAction, NavbarState, MOBILE_BREAKPOINT};
use masthead::placeholder;
use masthead::site::Site;
use masthead::submissions::{self, SubscribeOutcome};
use masthead::notify::ToastKind;
use masthead::validate::{Field, FieldKind, Form, FormOutcome};
use rustyline::error::ReadlineError;
use rustyline::DefaultEditor;
use std::cell::RefCell;
use std::path::PathBuf;

pub struct Context {
    pub args: Args,
    pub root: PathBuf,
    pub session_id: String,
    pub activity_path: Option<PathBuf>,
    pub site: RefCell<Site>,
    pub navbar: RefCell<NavbarState>,
}

pub fn run_once(ctx: &Context, line: &str) -> Result<()> {
    handle_line(ctx, line);
    Ok(())
}

pub fn run_repl(ctx: Context) -> Result<()> {
    let mut rl = DefaultEditor::new()?;
    let history = ctx.root.join(config::STATE_DIR).join("history");
    // Missing on first run
    let _ = rl.load_history(&history);

    println!("masthead - type help for commands, exit to quit");

    loop {
        let prompt = match ctx.site.borrow_mut().current_user() {
            Some(session) => format!("{}> ", session.name),
            None => "guest> ".to_string(),
        };

        match rl.readline(&prompt) {
            Ok(line) => {
                let line = line.trim();
                if line.is_empty() {
                    continue;
                }
                rl.add_history_entry(line)?;

                if handle_line(&ctx, line) {
                    break;
                }
            }
            Err(ReadlineError::Interrupted | ReadlineError::Eof) => break,
            Err(e) => {
                eprintln!("Input error: {}", e);
                break;
            }
        }
    }

    if history.parent().is_some_and(|p| p.exists()) {
        if let Err(e) = rl.save_history(&history) {
            eprintln!("Warning: failed to save history: {}", e);
        }
    }

    Ok(())
}

/// Run one command line and print any toasts it raised. Returns true on exit.
fn handle_line(ctx: &Context, line: &str) -> bool {
    let words = match shell_words::split(line) {
        Ok(words) => words,
        Err(e) => {
            println!("Parse error: {}", e);
            return false;
        }
    };
    let Some((name, rest)) = words.split_first() else {
        return false;
    };

    let mark = {
        let mut site = ctx.site.borrow_mut();
        site.toasts_mut().expire(Utc::now());
        site.command(name);
        site.toasts().last_id()
    };

    let exit = handle_command(ctx, name, rest);

    let site = ctx.site.borrow();
    for toast in site.toasts().newer_than(mark) {
        println!("{}", toast);
    }
    exit
}

fn handle_command(ctx: &Context, name: &str, args: &[String]) -> bool {
    let mut site = ctx.site.borrow_mut();
    match name {
        "exit" | "quit" => return true,
        "help" => print_help(),
        "session" => {
            println!("Session: {}", ctx.session_id);
            match &ctx.activity_path {
                Some(path) => println!("Activity: {}", path.display()),
                None => println!("Activity: off"),
            }
        }
        "register" => {
            let [full_name, email, password] = args else {
                println!("Usage: register <name> <email> <password>");
                return false;
            };
            let data = NewAccount {
                name: full_name.clone(),
                email: email.clone(),
                password: password.clone(),
            };
            // Failures are reported as toasts
            if let Some(account) = site.register(data).ok().and_then(FormOutcome::accepted) {
                println!("Registered {} ({})", account.email, account.id);
                println!("Next: {}", masthead::auth::paths::USER_LOGIN);
            }
        }
        "login" => {
            let [email, password] = args else {
                println!("Usage: login <email> <password>");
                return false;
            };
            if let Ok(session) = site.login(email, password) {
                println!("Logged in as {} ({})", session.email, session.role.as_str());
            }
        }
        "logout" => {
            if let Ok(target) = site.logout() {
                ctx.navbar.borrow_mut().reset();
                println!("Redirect: {}", target);
            }
        }
        "whoami" => match site.current_user() {
            Some(session) => println!(
                "{} <{}> role={} since {}",
                session.name,
                session.email,
                session.role.as_str(),
                session.login_time.format("%Y-%m-%d %H:%M")
            ),
            None => println!("Not logged in"),
        },
        "nav" => {
            let state = site.nav_state();
            let visibility = state.visibility();
            println!("State: {}", state.as_str());
            for set in ElementSet::ALL {
                let shown = if visibility.is_shown(set) { "shown" } else { "hidden" };
                println!("  .{}: {}", set.class_name(), shown);
            }
            let navbar = ctx.navbar.borrow();
            println!(
                "  scrolled={} menu_open={} profile_open={}",
                navbar.scrolled, navbar.menu_open, navbar.profile_open
            );
        }
        "scroll" => {
            let Some(offset) = args.first().and_then(|a| a.parse::<f64>().ok()) else {
                println!("Usage: scroll <offset>");
                return false;
            };
            let mut navbar = ctx.navbar.borrow_mut();
            navbar.on_scroll(offset);
            println!("Navbar scrolled: {}", navbar.scrolled);
        }
        "menu" => {
            let mut navbar = ctx.navbar.borrow_mut();
            let open = navbar.toggle_menu();
            println!(
                "Menu {} (body locked: {})",
                if open { "open, scrolled to top" } else { "closed" },
                navbar.body_locked()
            );
        }
        "link" => {
            let Some(href) = args.first() else {
                println!("Usage: link <href> [dropdown|-] [viewport-width]");
                return false;
            };
            let dropdown = args.get(1).map(String::as_str).filter(|d| *d != "-");
            let width = args
                .get(2)
                .and_then(|w| w.parse::<u32>().ok())
                .unwrap_or(MOBILE_BREAKPOINT);
            let mut navbar = ctx.navbar.borrow_mut();
            match navbar.activate_link(href, dropdown, width) {
                LinkAction::ToggledDropdown => {
                    let name = dropdown.unwrap_or_default();
                    println!("Dropdown {} open: {}", name, navbar.is_dropdown_open(name));
                }
                LinkAction::Anchor(anchor) => println!("Scroll to {}", anchor),
                LinkAction::Navigate { href, delay_ms } => {
                    println!("Navigate to {} after {}ms", href, delay_ms)
                }
            }
        }
        "profile" => {
            let mut navbar = ctx.navbar.borrow_mut();
            match args.first().map(String::as_str) {
                Some("close") => navbar.click_outside_profile(),
                _ => navbar.toggle_profile(),
            }
            println!("Profile popup open: {}", navbar.profile_open);
        }
        "guard" => {
            let guard = match args.first().map(String::as_str) {
                Some("user") => site.guard_page(),
                Some("admin") => site.guard_admin_page(),
                _ => {
                    println!("Usage: guard user|admin");
                    return false;
                }
            };
            match guard {
                Guard::Allow => println!("Allowed"),
                Guard::Redirect(target) => println!("Redirect: {}", target),
            }
        }
        "articles" => {
            let category = args.first().map(String::as_str).unwrap_or(ALL_CATEGORIES);
            println!("{}", catalog::render_list(&site.catalog().filter_by_category(category)));
        }
        "search" => {
            let query = args.join(" ");
            println!("{}", catalog::render_list(&site.catalog().search(&query)));
        }
        "article" => {
            let Some(id) = args.first() else {
                println!("Usage: article <id>");
                return false;
            };
            match site.catalog().get_by_id(id) {
                Some(article) => println!("{}", catalog::render_card(article)),
                None => println!("Article not found"),
            }
        }
        "featured" => println!("{}", catalog::render_list(&site.catalog().get_featured())),
        "recent" => {
            let recent = match args.first() {
                Some(n) => match n.parse::<usize>() {
                    Ok(limit) => site.catalog().get_recent(limit),
                    Err(_) => {
                        println!("Usage: recent [n]");
                        return false;
                    }
                },
                None => site.recent(),
            };
            println!("{}", catalog::render_list(&recent));
        }
        "categories" => {
            for category in site.catalog().categories() {
                println!("  {}", category);
            }
        }
        "contact" => {
            let mut required = Vec::new();
            let mut optional = Vec::new();
            for arg in args {
                let Some((field, value)) = arg.split_once('=') else {
                    println!("Expected field=value, got '{}'", arg);
                    return false;
                };
                // `field?=value` is not required
                match field.strip_suffix('?') {
                    Some(field) => optional.push((field, value)),
                    None => required.push((field, value)),
                }
            }
            let mut form = Form::from_pairs(required);
            for (field, value) in optional {
                form = form.with(Field::new(field, FieldKind::infer(field), value).optional());
            }
            match site.submit_contact(&mut form) {
                Ok(FormOutcome::Accepted(saved)) => println!("Saved message {}", saved.id),
                Ok(FormOutcome::Rejected) => {
                    for (field, message) in form.errors() {
                        println!("  {}: {}", field, message);
                    }
                }
                Err(_) => {}
            }
        }
        "subscribe" => {
            let email = args.join(" ");
            if let Ok(SubscribeOutcome::Subscribed) = site.subscribe(&email) {
                let total = submissions::subscribers(site.storage()).len();
                println!("Subscribed {} ({} on the list)", email.trim(), total);
            }
        }
        "subscribers" => {
            for email in submissions::subscribers(site.storage()) {
                println!("  {}", email);
            }
        }
        "contacts" => {
            for contact in submissions::contacts(site.storage()) {
                let fields: Vec<String> = contact
                    .fields
                    .iter()
                    .map(|(k, v)| format!("{}={:?}", k, v))
                    .collect();
                println!(
                    "  {} {} {}",
                    contact.id,
                    contact.submitted_at.format("%Y-%m-%d %H:%M"),
                    fields.join(" ")
                );
            }
        }
        "users" => {
            for account in site.accounts() {
                println!("  {} {} <{}> {}", account.id, account.name, account.email, account.role.as_str());
            }
        }
        "reset" => {
            if site.reset().is_ok() {
                ctx.navbar.borrow_mut().reset();
            }
        }
        "toast" => {
            let [kind, title, message] = args else {
                println!("Usage: toast <success|error|warning|info> <title> <message>");
                return false;
            };
            site.toasts_mut().push(title, message, ToastKind::from_name(kind));
        }
        "toasts" => {
            let toasts = site.toasts().active();
            if toasts.is_empty() {
                println!("No active toasts");
            }
            for toast in toasts {
                println!("  {} {}", toast.id, toast);
            }
        }
        "dismiss" => {
            let Some(id) = args.first().and_then(|a| a.parse::<u64>().ok()) else {
                println!("Usage: dismiss <id>");
                return false;
            };
            if !site.toasts_mut().dismiss(id) {
                println!("No toast {}", id);
            }
        }
        "placeholder" => {
            let (Some(badge), Some(title)) = (args.first(), args.get(1)) else {
                println!("Usage: placeholder <badge|-> <title> [current-src]");
                return false;
            };
            let badge = Some(badge.as_str()).filter(|b| *b != "-");
            let current = args.get(2).map(String::as_str).unwrap_or_default();
            match placeholder::fallback_for(badge, title, current) {
                Some(url) => println!("{}", url),
                None => println!("Already showing the placeholder"),
            }
        }
        _ => println!("Unknown command: {} (try help)", name),
    }
    false
}

fn print_help() {
    println!("Account:");
    println!("  register <name> <email> <password>");
    println!("  login <email> <password>");
    println!("  logout");
    println!("  whoami");
    println!("  guard user|admin     - check page access");
    println!("Navigation:");
    println!("  nav                  - navbar visibility for this session");
    println!("  scroll <offset>      - scroll the page");
    println!("  menu                 - toggle the mobile menu");
    println!("  link <href> [dropdown|-] [viewport-width]  (quote a bare \"#\")");
    println!("  profile [close]      - toggle or close the profile popup");
    println!("Articles:");
    println!("  articles [category]");
    println!("  search <query>");
    println!("  article <id>");
    println!("  featured");
    println!("  recent [n]");
    println!("  categories");
    println!("  placeholder <badge|-> <title> [current-src]");
    println!("Forms:");
    println!("  contact field=value... (field?=value for optional fields)");
    println!("  subscribe <email>");
    println!("Stored data:");
    println!("  users                - list accounts");
    println!("  contacts             - list contact messages");
    println!("  subscribers          - list newsletter subscribers");
    println!("  reset                - wipe the store and seed the admin again");
    println!("Toasts:");
    println!("  toast <type> <title> <message>");
    println!("  toasts               - list active toasts");
    println!("  dismiss <id>");
    println!("Shell:");
    println!("  session              - show session info");
    println!("  help");
    println!("  exit");
}
