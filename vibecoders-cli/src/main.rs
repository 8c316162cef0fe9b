use std::fs;
use std::io::{self, stdin, stdout, Read, Write};
use std::path::PathBuf;

use structopt::StructOpt;
use termion::cursor;
use termion::event::Key;
use termion::input::TermRead;
use termion::raw::IntoRawMode;
use termion::screen::AlternateScreen;
use tokio::runtime::Runtime;

use vibecoders::auth::AuthSession;
use vibecoders::budget::BudgetSession;
use vibecoders::feed::{FeedSession, VoteOutcome};
use vibecoders::models::{NewPost, Post, Registration, SortMode};
use vibecoders::url::Url;
use vibecoders::{Client, Error as ApiError};

mod app;
mod error;
mod render;
mod text;
mod theme;
mod util;

use app::FeedView;
use error::Error;
use text::Fancy;
use theme::{Theme, VIBE_256, VIBE_GREY};

type CommandResult = Result<(), Error>;

#[derive(Debug, StructOpt)]
enum Command {
    /// Log in with username and password
    #[structopt(name = "login")]
    Login(Login),
    /// Log out and end the server-side session
    #[structopt(name = "logout")]
    Logout,
    /// Register a new account
    #[structopt(name = "register")]
    Register(Register),
    /// Show who is currently logged in
    #[structopt(name = "whoami")]
    Whoami,
    /// Browse the forum feed (this is the default)
    #[structopt(name = "feed")]
    Feed(Feed),
    /// Show one post with its comments
    #[structopt(name = "show")]
    Show(Show),
    /// Create a new post
    #[structopt(name = "post")]
    Post(NewPostOpts),
    /// Comment on a post
    #[structopt(name = "comment")]
    Comment(Comment),
    /// Budget tracker
    #[structopt(name = "budget")]
    Budget(Budget),
    /// Manage password-less login links
    #[structopt(name = "magic-links")]
    MagicLinks(MagicLinks),
    /// Admin user management
    #[structopt(name = "admin")]
    Admin(Admin),
}

#[derive(Debug, StructOpt)]
struct Login {
    /// Username to log in as
    username: String,
}

#[derive(Debug, StructOpt)]
struct Register {
    /// Desired username
    username: String,

    /// Profile text
    #[structopt(long = "bio", default_value = "")]
    bio: String,

    /// LinkedIn profile URL
    #[structopt(long = "linkedin", default_value = "")]
    linked_in_url: String,

    /// GitHub profile URL
    #[structopt(long = "github", default_value = "")]
    github_url: String,

    /// Avatar URL
    #[structopt(long = "photo", default_value = "")]
    photo_url: String,
}

#[derive(Debug, Default, StructOpt)]
struct Feed {
    /// Sort mode. Options: top, newest
    #[structopt(short = "s", long = "sort", default_value = "top")]
    sort: SortMode,

    /// Theme to use. Options: 256, grey or gray
    #[structopt(short = "t", long = "theme", default_value = "256")]
    theme: UiTheme,
}

#[derive(Debug, StructOpt)]
struct Show {
    /// Id of the post
    id: i64,
}

#[derive(Debug, StructOpt)]
struct NewPostOpts {
    /// Post title
    title: String,

    /// External link
    #[structopt(short = "u", long = "url", default_value = "")]
    url: String,

    /// Text body
    #[structopt(short = "c", long = "content", default_value = "")]
    content: String,
}

#[derive(Debug, StructOpt)]
struct Comment {
    /// Id of the post to comment on
    id: i64,

    /// Comment text
    content: String,
}

#[derive(Debug, StructOpt)]
struct Budget {
    #[structopt(subcommand)]
    command: BudgetCommand,
}

#[derive(Debug, StructOpt)]
enum BudgetCommand {
    /// List transactions with their categories
    #[structopt(name = "list")]
    List,
    /// List categories
    #[structopt(name = "categories")]
    Categories,
    /// Create a category
    #[structopt(name = "new-category")]
    NewCategory {
        /// Name of the category
        name: String,
    },
    /// Import transactions pasted as `MM/DD/YYYY amount description` lines
    #[structopt(name = "import")]
    Import {
        /// File to read; stdin when omitted
        file: Option<PathBuf>,
    },
    /// Assign a category to a transaction, or clear it
    #[structopt(name = "assign")]
    Assign {
        /// Id of the transaction
        transaction: i64,
        /// Id of the category; omit to clear
        category: Option<i64>,
    },
}

#[derive(Debug, StructOpt)]
struct MagicLinks {
    #[structopt(subcommand)]
    command: MagicLinksCommand,
}

#[derive(Debug, StructOpt)]
enum MagicLinksCommand {
    /// List the viewer's magic links
    #[structopt(name = "list")]
    List,
    /// Mint a new magic link
    #[structopt(name = "new")]
    New {
        /// Where the link should land after signing in
        #[structopt(short = "r", long = "redirect")]
        redirect: Option<String>,
    },
    /// Delete a magic link
    #[structopt(name = "delete")]
    Delete {
        /// Id of the link
        id: i64,
    },
}

#[derive(Debug, StructOpt)]
struct Admin {
    #[structopt(subcommand)]
    command: AdminCommand,
}

#[derive(Debug, StructOpt)]
enum AdminCommand {
    /// List users
    #[structopt(name = "users")]
    Users {
        /// Page to view
        #[structopt(short = "p", long = "page", default_value = "1")]
        page: u32,
        /// Users per page
        #[structopt(long = "page-size", default_value = "10")]
        page_size: u32,
    },
    /// Show one user
    #[structopt(name = "show")]
    Show {
        /// Id of the user
        id: i64,
    },
    /// Delete a user
    #[structopt(name = "delete")]
    Delete {
        /// Id of the user
        id: i64,
    },
}

#[derive(Debug, StructOpt)]
struct App {
    /// Base URL of the remote site
    #[structopt(
        short = "b",
        long = "base-url",
        default_value = "http://localhost:8080/",
        parse(try_from_str = util::parse_url)
    )]
    base_url: Url,

    #[structopt(subcommand)]
    command: Option<Command>,
}

#[derive(Debug)]
enum UiTheme {
    Color256,
    Grey,
}

impl UiTheme {
    fn palette(&self) -> &'static Theme {
        match self {
            UiTheme::Color256 => &VIBE_256,
            UiTheme::Grey => &VIBE_GREY,
        }
    }
}

impl Default for UiTheme {
    fn default() -> Self {
        UiTheme::Color256
    }
}

impl std::str::FromStr for UiTheme {
    type Err = ApiError;

    fn from_str(theme: &str) -> Result<Self, Self::Err> {
        match theme {
            "256" => Ok(UiTheme::Color256),
            "grey" | "gray" => Ok(UiTheme::Grey),
            other => Err(ApiError::Validation(format!(
                "'{}' is not a valid theme. Options are: 256, grey or gray",
                other
            ))),
        }
    }
}

fn main() {
    env_logger::init();
    let app = App::from_args();
    let rt = Runtime::new().expect("error creating runtime");
    let client = Client::new(app.base_url).expect("error creating client");

    let result = match app.command.unwrap_or(Command::Feed(Feed::default())) {
        Command::Login(options) => login(&rt, &client, options),
        Command::Logout => logout(&rt, &client),
        Command::Register(options) => register(&rt, &client, options),
        Command::Whoami => whoami(&rt, &client),
        Command::Feed(options) => feed(&rt, &client, options),
        Command::Show(options) => show(&rt, &client, options),
        Command::Post(options) => post(&rt, &client, options),
        Command::Comment(options) => comment(&rt, &client, options),
        Command::Budget(options) => budget(&rt, &client, options.command),
        Command::MagicLinks(options) => magic_links(&rt, &client, options.command),
        Command::Admin(options) => admin(&rt, &client, options.command),
    };

    let result = result.and_then(|()| client.save_cookies().map_err(Error::from));

    if let Err(err) = result {
        eprintln!("Error: {}", err);
        std::process::exit(1);
    }
}

fn prompt_password(prompt: &str) -> Result<String, Error> {
    let stdout = stdout();
    let mut stdout = stdout.lock();
    write!(stdout, "{}", prompt)?;
    stdout.flush()?;

    let password = {
        let _raw = stdout.into_raw_mode()?;
        stdin().lock().read_passwd(&mut io::sink())?
    };
    println!();

    password.ok_or(Error::Cancelled)
}

fn login(rt: &Runtime, client: &Client, options: Login) -> CommandResult {
    let password = prompt_password("Password: ")?;

    let mut auth = AuthSession::signed_out();
    let user = rt.block_on(auth.login(client, &options.username, &password))?;
    println!("Logged in as {}", user.username);
    Ok(())
}

fn logout(rt: &Runtime, client: &Client) -> CommandResult {
    let mut auth = rt.block_on(AuthSession::resume(client))?;
    rt.block_on(auth.logout(client))?;
    println!("Logged out");
    Ok(())
}

fn register(rt: &Runtime, client: &Client, options: Register) -> CommandResult {
    let password = prompt_password("Password: ")?;
    let confirm_password = prompt_password("Confirm password: ")?;

    let registration = Registration {
        username: options.username,
        password,
        confirm_password,
        bio: options.bio,
        linked_in_url: options.linked_in_url,
        github_url: options.github_url,
        photo_url: options.photo_url,
    };
    rt.block_on(AuthSession::register(client, &registration))?;
    println!("Registered. Log in with: vibecoders login {}", registration.username);
    Ok(())
}

fn whoami(rt: &Runtime, client: &Client) -> CommandResult {
    let auth = rt.block_on(AuthSession::resume(client))?;
    match auth.viewer() {
        Some(user) if user.is_admin => println!("{} (admin)", user.username),
        Some(user) => println!("{}", user.username),
        None => println!("Not logged in"),
    }
    Ok(())
}

fn feed(rt: &Runtime, client: &Client, options: Feed) -> CommandResult {
    let auth = rt.block_on(AuthSession::resume(client))?;
    let mut session = FeedSession::new();

    print!("Loading...");
    stdout().flush()?;
    rt.block_on(session.change_sort(client, options.sort))?;
    println!(" done.");

    if session.posts().is_empty() {
        println!("There are no posts to show.");
        return Ok(());
    }

    let theme = options.theme.palette();
    let mut view = FeedView::new();
    let mut status = help_status(&session);

    {
        let screen = AlternateScreen::from(stdout());
        let mut screen = screen.into_raw_mode()?;
        write!(screen, "{}", cursor::Hide)?;

        redraw(&mut screen, &session, &mut view, theme, &status)?;

        let mut detail_open = false;

        for key in stdin().keys() {
            let key = key?;

            if detail_open {
                match key {
                    Key::Char('q') | Key::Char('c') | Key::Esc => {
                        detail_open = false;
                        redraw(&mut screen, &session, &mut view, theme, &status)?;
                    }
                    _ => (),
                }
                continue;
            }

            match key {
                Key::Char('q') | Key::Esc => break,
                Key::Char('j') | Key::Down => {
                    view.next(session.posts().len());
                }
                Key::Char('k') | Key::Up => {
                    view.prev();
                }
                Key::Char('t') => {
                    change_sort(rt, client, &mut session, &mut view, SortMode::Top, &mut status);
                }
                Key::Char('n') => {
                    change_sort(rt, client, &mut session, &mut view, SortMode::Newest, &mut status);
                }
                Key::Char('m') => match rt.block_on(session.load_next_page(client)) {
                    Ok(true) => status = format!("page {} loaded", session.page()),
                    Ok(false) => (),
                    Err(err) => status = err.to_string(),
                },
                Key::Char('v') => {
                    // The list can be empty, e.g. after a failed sort switch
                    if let Some(post_id) = selected_post(&session, &view).map(|post| post.id) {
                        match rt.block_on(session.vote(client, &auth, post_id)) {
                            Ok(VoteOutcome::Updated(post)) => {
                                status = format!("post {} now at {}", post.id, post.score)
                            }
                            Ok(VoteOutcome::Skipped) => status = "vote debounced".to_string(),
                            Err(err) => status = err.to_string(),
                        }
                    }
                }
                Key::Char('c') => {
                    if let Some(post_id) = selected_post(&session, &view).map(|post| post.id) {
                        match rt.block_on(session.open_post_detail(client, post_id)) {
                            Ok(_) => detail_open = true,
                            Err(err) => status = err.to_string(),
                        }
                    }
                }
                Key::Char('\n') => {
                    if let Some(post) = selected_post(&session, &view) {
                        match post_link(client, post) {
                            Ok(url) => {
                                let _ = opener::open(url.as_str());
                            }
                            Err(err) => status = err.to_string(),
                        }
                    }
                }
                _ => (),
            }

            if detail_open {
                draw_detail(&mut screen, &session, theme)?;
            } else {
                redraw(&mut screen, &session, &mut view, theme, &status)?;
            }
        }

        write!(screen, "{}", cursor::Show)?;
    }

    Ok(())
}

fn change_sort(
    rt: &Runtime,
    client: &Client,
    session: &mut FeedSession,
    view: &mut FeedView,
    sort: SortMode,
    status: &mut String,
) {
    match rt.block_on(session.change_sort(client, sort)) {
        Ok(()) => {
            view.reset();
            *status = help_status(session);
        }
        Err(err) => *status = err.to_string(),
    }
}

fn help_status(session: &FeedSession) -> String {
    format!(
        "sorted by {} | j/k move  t/n sort  v vote  c comments  m more  Enter open  q quit",
        session.sort()
    )
}

/// The post under the cursor, if the list has one there
fn selected_post<'a>(session: &'a FeedSession, view: &FeedView) -> Option<&'a Post> {
    session.posts().get(view.cursor())
}

fn redraw<W: Write>(
    screen: &mut W,
    session: &FeedSession,
    view: &mut FeedView,
    theme: &Theme,
    status: &str,
) -> Result<(), Error> {
    let (width, height) = util::as_usize(termion::terminal_size()?);
    let body_height = height.saturating_sub(1);

    view.ensure_visible(body_height);
    let lines = render::feed_lines(session.posts(), view, theme, body_height);
    render::draw(screen, &lines, status, theme, width, height)
}

fn draw_detail<W: Write>(screen: &mut W, session: &FeedSession, theme: &Theme) -> Result<(), Error> {
    let (width, height) = util::as_usize(termion::terminal_size()?);

    let mut lines = match session.open_post() {
        Some(post) => render::detail_lines(post, theme),
        None => Vec::new(),
    };
    lines.truncate(height.saturating_sub(1));
    render::draw(screen, &lines, "q/c back to the feed", theme, width, height)
}

/// The post's external link, or its own page on the site for text posts
fn post_link(client: &Client, post: &Post) -> Result<Url, Error> {
    if post.url.is_empty() {
        client
            .base_url()
            .join(&format!("forum/{}", post.id))
            .map_err(Error::from)
    } else {
        post.url.parse().map_err(Error::from)
    }
}

fn show(rt: &Runtime, client: &Client, options: Show) -> CommandResult {
    let mut session = FeedSession::new();
    let post = rt.block_on(session.open_post_detail(client, options.id))?;
    print_post(post);
    Ok(())
}

fn print_post(post: &Post) {
    let theme = &VIBE_256;
    println!(
        "{} {}",
        Fancy::new(post.score.to_string()).fg(theme.score),
        Fancy::new(&post.title).fg(theme.title).bold(),
    );
    println!(
        "{}",
        Fancy::new(format!(
            "via {} {}",
            post.author().unwrap_or("unknown"),
            chrono_humanize::HumanTime::from(post.created_at)
        ))
        .fg(theme.byline)
    );
    if !post.url.is_empty() {
        println!("{}", Fancy::new(&post.url).fg(theme.domain).italic());
    }
    if !post.content.is_empty() {
        println!("\n{}", post.content);
    }

    if post.comments.is_empty() {
        println!("\nNo comments.");
    } else {
        println!("\n{} comments:", post.comments.len());
        for comment in &post.comments {
            println!(
                "\n  {} {}",
                Fancy::new(comment.author().unwrap_or("unknown")).fg(theme.title),
                Fancy::new(chrono_humanize::HumanTime::from(comment.created_at).to_string())
                    .fg(theme.byline),
            );
            println!("  {}", comment.content);
        }
    }
}

fn post(rt: &Runtime, client: &Client, options: NewPostOpts) -> CommandResult {
    let new_post = NewPost {
        title: options.title,
        content: options.content,
        url: options.url,
    };

    let mut session = FeedSession::new();
    let post = rt.block_on(session.create_post(client, &new_post))?;
    println!("Created post {}: {}", post.id, post.title);
    Ok(())
}

fn comment(rt: &Runtime, client: &Client, options: Comment) -> CommandResult {
    let mut session = FeedSession::new();
    let post = rt.block_on(session.add_comment(client, options.id, options.content))?;
    println!(
        "Comment added, post {} now has {} comments",
        post.id,
        post.comments.len()
    );
    Ok(())
}

fn budget(rt: &Runtime, client: &Client, command: BudgetCommand) -> CommandResult {
    let mut session = BudgetSession::new();

    match command {
        BudgetCommand::List => {
            rt.block_on(session.refresh(client))?;
            print_transactions(&session);
        }
        BudgetCommand::Categories => {
            rt.block_on(session.refresh(client))?;
            for category in session.categories() {
                println!("{:4}  {}", category.id, category.name);
            }
            if session.categories().is_empty() {
                println!("No categories.");
            }
        }
        BudgetCommand::NewCategory { name } => {
            let category = rt.block_on(session.add_category(client, &name))?;
            println!("Created category {}: {}", category.id, category.name);
        }
        BudgetCommand::Import { file } => {
            let raw = match file {
                Some(path) => fs::read_to_string(path)?,
                None => {
                    let mut raw = String::new();
                    stdin().read_to_string(&mut raw)?;
                    raw
                }
            };
            let count = rt.block_on(session.bulk_import(client, &raw))?;
            println!("Imported {} transactions", count);
            print_transactions(&session);
        }
        BudgetCommand::Assign {
            transaction,
            category,
        } => {
            rt.block_on(session.refresh(client))?;
            rt.block_on(session.assign_category(client, transaction, category))?;
            match category {
                Some(id) => println!("Transaction {} assigned to category {}", transaction, id),
                None => println!("Transaction {} category cleared", transaction),
            }
        }
    }

    Ok(())
}

fn print_transactions(session: &BudgetSession) {
    let theme = &VIBE_256;

    for txn in session.transactions() {
        let amount_colour = if txn.amount < 0.0 {
            theme.negative
        } else {
            theme.positive
        };
        println!(
            "{:4}  {}  {}  {}  {}",
            txn.id,
            Fancy::new(&txn.date).fg(theme.byline),
            Fancy::new(format!("{:>10.2}", txn.amount)).fg(amount_colour),
            txn.description,
            Fancy::new(&txn.category_name).fg(theme.domain).italic(),
        );
    }
    if session.transactions().is_empty() {
        println!("No transactions.");
    }
}

fn magic_links(rt: &Runtime, client: &Client, command: MagicLinksCommand) -> CommandResult {
    match command {
        MagicLinksCommand::List => {
            let links = rt.block_on(client.magic_links())?;
            for link in &links {
                let url = client.base_url().join(&format!("magic/{}", link.token))?;
                println!("{:4}  {}  expires {}", link.id, url, link.expires_at.date_naive());
            }
            if links.is_empty() {
                println!("No magic links.");
            }
        }
        MagicLinksCommand::New { redirect } => {
            let link = rt.block_on(client.create_magic_link(redirect.as_deref()))?;
            let url = client.base_url().join(&format!("magic/{}", link.token))?;
            println!("Created magic link {}", url);
        }
        MagicLinksCommand::Delete { id } => {
            rt.block_on(client.delete_magic_link(id))?;
            println!("Deleted magic link {}", id);
        }
    }

    Ok(())
}

fn admin(rt: &Runtime, client: &Client, command: AdminCommand) -> CommandResult {
    match command {
        AdminCommand::Users { page, page_size } => {
            let listing = rt.block_on(client.admin_users(page, page_size))?;
            for user in &listing.users {
                let marker = if user.is_admin { "*" } else { " " };
                println!("{:4} {} {}", user.id, marker, user.username);
            }
            println!(
                "page {} of {} ({} users)",
                listing.pagination.page, listing.pagination.total_pages, listing.pagination.total
            );
        }
        AdminCommand::Show { id } => {
            let user = rt.block_on(client.admin_user(id))?;
            println!("{:4}  {}", user.id, user.username);
            if !user.fullname.is_empty() {
                println!("      {}", user.fullname);
            }
            if !user.bio.is_empty() {
                println!("      {}", user.bio);
            }
            println!("      admin: {}", user.is_admin);
            println!("      joined: {}", user.created_at.date_naive());
        }
        AdminCommand::Delete { id } => {
            rt.block_on(client.admin_delete_user(id))?;
            println!("Deleted user {}", id);
        }
    }

    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn empty_feed_has_no_selected_post() {
        // A failed sort switch leaves the session with an empty list; the
        // vote and open handlers must find nothing rather than index into it
        let session = FeedSession::new();
        let view = FeedView::new();
        assert!(selected_post(&session, &view).is_none());
    }
}
