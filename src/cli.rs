use clap::{Parser, Subcommand};

#[derive(Parser)]
#[command(name = "mediarelay")]
#[command(author, version, about = "Media extraction server with live download progress", long_about = None)]
pub struct Cli {
    #[command(subcommand)]
    pub command: Option<Commands>,
}

#[derive(Subcommand)]
pub enum Commands {
    /// Run the HTTP/WebSocket server
    Serve {
        /// Listen port (overrides PORT)
        #[arg(short, long)]
        port: Option<u16>,
    },

    /// Print the available formats for a URL and exit
    Info {
        /// Media URL
        url: String,

        /// Print the raw JSON instead of a table
        #[arg(long)]
        json: bool,
    },
}

impl Cli {
    pub fn parse_args() -> Self {
        Self::parse()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_no_subcommand() {
        let cli = Cli::try_parse_from(["mediarelay"]).unwrap();
        assert!(cli.command.is_none());
    }

    #[test]
    fn test_serve_with_port() {
        let cli = Cli::try_parse_from(["mediarelay", "serve", "--port", "8081"]).unwrap();
        assert!(matches!(cli.command, Some(Commands::Serve { port: Some(8081) })));
    }

    #[test]
    fn test_info_json() {
        let cli = Cli::try_parse_from(["mediarelay", "info", "https://youtu.be/abc", "--json"]).unwrap();
        match cli.command {
            Some(Commands::Info { url, json }) => {
                assert_eq!(url, "https://youtu.be/abc");
                assert!(json);
            }
            _ => panic!("expected info"),
        }
    }
}
