use anyhow::{Context, Result};
use clap::{Args, Parser, Subcommand};
use httpkit::{ClientOptions, TracedClient};
use mimalloc::MiMalloc;
use runtime::{AppConfig, CliArgs};
use student_portal::domain::forms::{
    LoginForm, RegisterForm, SchoolChoice, SchoolForm, StudentForm,
};
use student_portal::domain::session::{clear_session, load_session, SessionStore};
use student_portal::{Outcome, PortalService, Route, StudentPortal, StudentPortalConfig};
use std::sync::Arc;
use std::path::PathBuf;
use std::process::ExitCode;
use std::time::Duration;

mod render;

#[global_allocator]
static GLOBAL: MiMalloc = MiMalloc;

const REDIRECT_EXIT: u8 = 2;
const SIGN_IN_HINT: &str = "Session expired or missing. Run `campus-cli login` to sign in.";

/// Campus CLI - sign in and browse student records
#[derive(Parser)]
#[command(name = "campus-cli")]
#[command(about = "Campus CLI - sign in and browse student records")]
#[command(version)]
struct Cli {
    /// Path to configuration file
    #[arg(short, long, global = true)]
    config: Option<PathBuf>,

    /// Base URL of the student API (overrides config)
    #[arg(long, global = true)]
    api_base: Option<String>,

    /// Print current configuration and exit
    #[arg(long)]
    print_config: bool,

    /// Log verbosity level (-v info, -vv debug, -vvv trace)
    #[arg(short, long, action = clap::ArgAction::Count, global = true)]
    verbose: u8,

    #[command(subcommand)]
    command: Option<Commands>,
}

#[derive(Subcommand)]
enum Commands {
    /// Sign in and store the session
    Login(LoginArgs),
    /// Create a new account
    Register(RegisterArgs),
    /// Create an account with elevated rights (requires a session)
    RegisterAdmin(RegisterArgs),
    /// List the schools offered at registration, or add one
    Schools {
        #[command(subcommand)]
        action: Option<SchoolCommand>,
    },
    /// Show the student dashboard
    #[command(alias = "students")]
    Dashboard,
    /// Show, add, update or delete a single student record
    #[command(subcommand)]
    Student(StudentCommand),
    /// Forget the stored session
    Logout,
    /// Show who is signed in
    Whoami,
    /// Check configuration
    Check,
}

#[derive(Subcommand)]
enum SchoolCommand {
    /// Create a school (requires a session)
    Add {
        #[arg(long)]
        name: String,
    },
}

#[derive(Subcommand)]
enum StudentCommand {
    /// Show one record
    Show { id: i64 },
    /// Create a record
    Add(StudentArgs),
    /// Replace a record's fields
    Update {
        id: i64,
        #[command(flatten)]
        fields: StudentArgs,
    },
    /// Delete a record
    Delete { id: i64 },
}

#[derive(Args)]
struct PasswordArgs {
    #[arg(long, conflicts_with = "password_stdin")]
    password: Option<String>,

    /// Read the password from the first line of stdin
    #[arg(long)]
    password_stdin: bool,
}

impl PasswordArgs {
    fn resolve(&self) -> Result<Option<String>> {
        if self.password_stdin {
            let mut line = String::new();
            std::io::stdin()
                .read_line(&mut line)
                .context("Failed to read password from stdin")?;
            return Ok(Some(line.trim_end_matches(['\r', '\n']).to_string()));
        }
        Ok(self.password.clone())
    }
}

#[derive(Args)]
struct SchoolArgs {
    /// Existing school to join
    #[arg(long)]
    school_id: Option<i64>,

    /// New school to create
    #[arg(long)]
    school_name: Option<String>,
}

impl SchoolArgs {
    fn choice(&self) -> Result<SchoolChoice> {
        Ok(SchoolChoice::from_parts(
            self.school_id,
            self.school_name.as_deref(),
        )?)
    }
}

#[derive(Args)]
struct LoginArgs {
    /// Email address
    #[arg(long)]
    username: String,

    #[command(flatten)]
    password: PasswordArgs,
}

#[derive(Args)]
struct RegisterArgs {
    #[arg(long)]
    name: String,

    #[arg(long)]
    email: String,

    #[command(flatten)]
    password: PasswordArgs,

    #[command(flatten)]
    school: SchoolArgs,
}

impl RegisterArgs {
    fn form(&self) -> Result<RegisterForm> {
        Ok(RegisterForm {
            name: self.name.clone(),
            email: self.email.clone(),
            password: self.password.resolve()?.unwrap_or_default(),
            school: self.school.choice()?,
        })
    }
}

#[derive(Args)]
struct StudentArgs {
    #[arg(long)]
    name: String,

    #[arg(long)]
    email: String,

    #[command(flatten)]
    password: PasswordArgs,

    #[command(flatten)]
    school: SchoolArgs,

    /// Role such as USER or ADMIN
    #[arg(long)]
    role: Option<String>,
}

impl StudentArgs {
    fn form(&self) -> Result<StudentForm> {
        Ok(StudentForm {
            name: self.name.clone(),
            email: self.email.clone(),
            password: self.password.resolve()?,
            school: self.school.choice()?,
            role: self.role.clone(),
        })
    }
}

#[tokio::main]
async fn main() -> Result<ExitCode> {
    let cli = Cli::parse();

    // CLI args passed down to config
    let args = CliArgs {
        config: cli.config.as_ref().map(|p| p.to_string_lossy().to_string()),
        api_base: cli.api_base.clone(),
        print_config: cli.print_config,
        verbose: cli.verbose,
    };

    // Load configuration (normalized home_dir is applied inside)
    let mut config = AppConfig::load_or_default(cli.config.as_deref())?;
    config.apply_cli_overrides(&args);

    let logging_config = config.logging.as_ref().cloned().unwrap_or_default();
    runtime::logging::init_logging_from_config(&logging_config, &config.home_dir());
    tracing::debug!(home_dir = %config.client.home_dir, "campus-cli starting");

    if cli.print_config {
        println!("{}", config.to_yaml()?);
        return Ok(ExitCode::SUCCESS);
    }

    let Some(command) = cli.command else {
        anyhow::bail!("no command given, see `campus-cli --help`");
    };

    match run(command, &config).await? {
        None => Ok(ExitCode::SUCCESS),
        Some(route) => {
            tracing::debug!(route = route.path(), "redirected");
            eprintln!("{}", SIGN_IN_HINT);
            Ok(ExitCode::from(REDIRECT_EXIT))
        }
    }
}

fn build_portal(config: &AppConfig) -> Result<PortalService> {
    let api_base = config.api_base_url()?;
    let timeout = match config.client.timeout_sec {
        0 => None,
        secs => Some(Duration::from_secs(secs)),
    };
    let client = TracedClient::with_options(&ClientOptions {
        timeout,
        user_agent: Some(format!("campus-cli/{}", env!("CARGO_PKG_VERSION"))),
    })
    .context("Failed to build HTTP client")?;

    let module_config: StudentPortalConfig = config.module_config(StudentPortal::NAME)?;
    Ok(StudentPortal::build(
        &module_config,
        &config.home_dir(),
        api_base,
        client,
    ))
}

fn session_store(config: &AppConfig) -> Result<Arc<dyn SessionStore>> {
    let module_config: StudentPortalConfig = config.module_config(StudentPortal::NAME)?;
    Ok(StudentPortal::session_store(&module_config, &config.home_dir()))
}

/// Run one command; `Some(route)` means the user has to go elsewhere first.
///
/// The HTTP side is only built for commands that reach the API, so `logout`
/// and `whoami` work with a broken `api_base`.
async fn run(command: Commands, config: &AppConfig) -> Result<Option<Route>> {
    let portal = || build_portal(config);
    match command {
        Commands::Login(a) => {
            let password = a.password.resolve()?.unwrap_or_default();
            portal()?
                .login(LoginForm::new(a.username.clone(), password))
                .await?;
            println!("Signed in as {}.", a.username.trim());
        }
        Commands::Register(a) => {
            let registered = portal()?.register(a.form()?).await?;
            println!(
                "Registered {} <{}>. Run `campus-cli login` to sign in.",
                registered.student.name, registered.student.email
            );
        }
        Commands::RegisterAdmin(a) => match portal()?.register_admin(a.form()?).await? {
            Outcome::Ready(student) => print!("{}", render::student(&student)),
            Outcome::Redirect(route) => return Ok(Some(route)),
        },
        Commands::Schools { action: None } => {
            print!("{}", render::schools(&portal()?.schools().await?))
        }
        Commands::Schools {
            action: Some(SchoolCommand::Add { name }),
        } => match portal()?.create_school(SchoolForm { name }).await? {
            Outcome::Ready(school) => println!("Created school {} ({}).", school.name, school.id),
            Outcome::Redirect(route) => return Ok(Some(route)),
        },
        Commands::Dashboard => match portal()?.dashboard().await? {
            Outcome::Ready(view) => print!("{}", render::dashboard(&view)),
            Outcome::Redirect(route) => return Ok(Some(route)),
        },
        Commands::Student(cmd) => return run_student(cmd, &portal()?).await,
        Commands::Logout => {
            clear_session(session_store(config)?.as_ref())?;
            tracing::info!("signed out");
            println!("Signed out.");
        }
        Commands::Whoami => match load_session(session_store(config)?.as_ref())? {
            Some(session) => println!(
                "{} ({})",
                session.user_email.as_deref().unwrap_or("signed in"),
                session.token_type
            ),
            None => return Ok(Some(Route::Login)),
        },
        Commands::Check => check_config(config)?,
    }
    Ok(None)
}

async fn run_student(cmd: StudentCommand, portal: &PortalService) -> Result<Option<Route>> {
    let outcome = match cmd {
        StudentCommand::Show { id } => portal.student(id).await?.map(|s| render::student(&s)),
        StudentCommand::Add(fields) => portal
            .create_student(fields.form()?)
            .await?
            .map(|s| render::student(&s)),
        StudentCommand::Update { id, fields } => portal
            .update_student(id, fields.form()?)
            .await?
            .map(|s| render::student(&s)),
        StudentCommand::Delete { id } => portal
            .delete_student(id)
            .await?
            .map(|()| format!("Deleted student {}.\n", id)),
    };

    match outcome {
        Outcome::Ready(text) => {
            print!("{}", text);
            Ok(None)
        }
        Outcome::Redirect(route) => Ok(Some(route)),
    }
}

fn check_config(config: &AppConfig) -> Result<()> {
    tracing::info!("Checking configuration...");

    let api_base = config.api_base_url()?;
    let module_config: StudentPortalConfig = config.module_config(StudentPortal::NAME)?;

    tracing::info!("Configuration is valid");
    println!("Configuration check passed");
    println!("API base: {}", api_base);
    println!(
        "Session file: {}",
        module_config.session_path(&config.home_dir()).display()
    );
    println!("{}", config.to_yaml()?);

    Ok(())
}
