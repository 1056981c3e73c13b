use std::ffi::OsString;

pub use clap::Parser;
use clap::Subcommand;

#[derive(Parser, Debug)]
#[command(version, about, long_about = None)]
struct ClapArgs {
    /// Profile name to use for the request. Default is 'default'.
    /// If the profile is not configured, the request will fail.
    #[clap(short = 'p', long, default_value = "default", help = "profile name")]
    profile: String,

    #[clap(short = 'v', long, help = "verbose output")]
    verbose: bool,

    /// Route the caller is on; decides whether an elevated session survives
    /// a failed refresh.
    #[clap(long, default_value = "/", help = "current application route")]
    route: String,

    #[command(subcommand)]
    command: ClapCommand,
}

#[derive(Subcommand, Debug)]
enum ClapCommand {
    /// Send a request through the session pipeline
    Request {
        method: String,
        path: String,
        #[clap(short = 'b', long, help = "JSON request body")]
        body: Option<String>,
    },
    /// Sign in and persist the session
    Login { username: String, password: String },
    /// Start an offline demo session
    DemoLogin,
    /// Sign out and clear the persisted session
    Logout,
    /// Show the signed-in user
    Whoami,
}

/// What the user asked the CLI to do
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Command {
    Request {
        method: String,
        path: String,
        body: Option<String>,
    },
    Login {
        username: String,
        password: String,
    },
    DemoLogin,
    Logout,
    Whoami,
}

impl From<ClapCommand> for Command {
    fn from(command: ClapCommand) -> Self {
        match command {
            ClapCommand::Request { method, path, body } => Self::Request {
                method: method.to_uppercase(),
                path,
                body,
            },
            ClapCommand::Login { username, password } => Self::Login { username, password },
            ClapCommand::DemoLogin => Self::DemoLogin,
            ClapCommand::Logout => Self::Logout,
            ClapCommand::Whoami => Self::Whoami,
        }
    }
}

#[derive(Debug, Clone)]
pub struct CommandLineArgs {
    profile: String,
    verbose: bool,
    route: String,
    command: Command,
}

impl CommandLineArgs {
    pub fn parse() -> Self {
        Self::from_clap(ClapArgs::parse())
    }

    pub fn parse_from<I, T>(itr: I) -> Self
    where
        I: IntoIterator<Item = T>,
        T: Into<OsString> + Clone,
    {
        Self::from_clap(ClapArgs::parse_from(itr))
    }

    fn from_clap(args: ClapArgs) -> Self {
        Self {
            profile: args.profile,
            verbose: args.verbose,
            route: args.route,
            command: args.command.into(),
        }
    }

    pub fn profile(&self) -> &String {
        &self.profile
    }

    pub fn verbose(&self) -> bool {
        self.verbose
    }

    pub fn route(&self) -> &str {
        &self.route
    }

    pub fn command(&self) -> &Command {
        &self.command
    }
}
