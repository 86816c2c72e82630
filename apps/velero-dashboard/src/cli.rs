use clap::Parser;
use std::path::PathBuf;

#[derive(Parser, Debug, Clone)]
#[command(
    name = "velero-dashboard",
    version,
    about = "Browse, inspect and manage velero backups, restores and schedules from a browser",
    long_about = "Serves the velero dashboard. Every page shells out to the velero CLI \
(DASHBOARD_VELERO_BIN) against DASHBOARD_KUBECONFIG; sign-in goes through OIDC unless \
DASHBOARD_AUTH_MODE=none."
)]
pub struct Args {
    /// Address the dashboard listens on.
    #[arg(long, default_value = "127.0.0.1")]
    pub host: String,
    #[arg(long, default_value_t = 8080)]
    pub port: u16,
    /// Directory served under /static; the built-in stylesheet is used when unset.
    #[arg(long)]
    pub static_root: Option<PathBuf>,
    /// Print the JSON endpoints' OpenAPI document and exit without touching velero.
    #[arg(long, default_value_t = false)]
    pub print_openapi: bool,
}

#[cfg(test)]
mod tests {
    use super::*;
    use clap::CommandFactory;

    #[test]
    fn defaults_bind_locally_on_8080() {
        let args = Args::parse_from(["velero-dashboard"]);
        assert_eq!(args.host, "127.0.0.1");
        assert_eq!(args.port, 8080);
        assert!(args.static_root.is_none());
        assert!(!args.print_openapi);
    }

    #[test]
    fn flags_override_defaults() {
        let args = Args::parse_from([
            "velero-dashboard",
            "--host",
            "0.0.0.0",
            "--port",
            "9090",
            "--static-root",
            "/srv/static",
            "--print-openapi",
        ]);
        assert_eq!(args.host, "0.0.0.0");
        assert_eq!(args.port, 9090);
        assert_eq!(args.static_root, Some(PathBuf::from("/srv/static")));
        assert!(args.print_openapi);
    }

    #[test]
    fn help_names_the_velero_settings() {
        let help = Args::command().render_long_help().to_string();
        assert!(help.contains("DASHBOARD_VELERO_BIN"));
        assert!(help.contains("--print-openapi"));
    }
}
