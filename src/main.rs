//! IIIF delivery router - decides where IIIF image requests are served from.
//!
//! This binary starts the HTTP server and configures all components.

use std::process::ExitCode;
use std::sync::Arc;
use std::time::Duration;

use clap::Parser;
use tracing::{error, info, warn};
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt};

use iiif_delivery_router::{
    config::{CheckConfig, Cli, Command, ServeConfig, SignConfig, SignOutputFormat},
    iiif::ImageApiVersion,
    routing::{ImageRequestRouter, ImageServerPathConfig, ImageServerPathResolver, VersionResolution},
    server::{auth::AccessTokenSigner, create_router, RouterConfig, IIIF_IMAGE_PREFIX},
};

#[tokio::main]
async fn main() -> ExitCode {
    let cli = Cli::parse();

    match cli.into_command() {
        Command::Serve(config) => run_serve(config).await,
        Command::Sign(config) => run_sign(config),
        Command::Check(config) => run_check(config),
    }
}

// =============================================================================
// Serve Command
// =============================================================================

async fn run_serve(config: ServeConfig) -> ExitCode {
    init_logging(config.verbose);

    if let Err(e) = config.validate() {
        error!("Configuration error: {}", e);
        return ExitCode::FAILURE;
    }

    let image_servers = match config.load_image_server_config() {
        Ok(image_servers) => image_servers,
        Err(e) => {
            error!("Configuration error: {}", e);
            return ExitCode::FAILURE;
        }
    };

    let settings = match config.routing_settings(image_servers) {
        Ok(settings) => settings,
        Err(e) => {
            error!("Configuration error: {}", e);
            return ExitCode::FAILURE;
        }
    };

    let store = match config.load_metadata() {
        Ok(store) => Arc::new(store),
        Err(e) => {
            error!("Failed to load metadata: {}", e);
            return ExitCode::FAILURE;
        }
    };

    info!("IIIF delivery router v{}", env!("CARGO_PKG_VERSION"));
    info!("Configuration:");
    info!("  Image server: {}", settings.image_server);
    info!("  Special server: {}", settings.special_server);
    info!("  Default image API version: {}", settings.default_version);
    info!("  Thumbs path: {}", settings.thumbs_path);
    match config.metadata_file {
        Some(ref path) => info!(
            "  Metadata: {} ({} customers, {} assets, {} header rules)",
            path.display(),
            store.customer_count(),
            store.asset_count(),
            store.header_rule_count()
        ),
        None => {
            warn!("  Metadata: none - every image request will return 404");
            warn!("            Provide one with --metadata-file=<path>");
        }
    }

    let image_router = ImageRequestRouter::new(
        store.clone(),
        store.clone(),
        store,
        Arc::new(config.access_validator()),
        settings,
    );

    let router = create_router(image_router, build_router_config(&config));

    let addr = config.bind_address();

    info!("");
    info!("  Server listening on: http://{}", addr);
    info!("    curl http://{}/health", addr);
    info!(
        "    curl -i http://{}{}/<customer>/<space>/<image>/full/max/0/default.jpg",
        addr, IIIF_IMAGE_PREFIX
    );
    info!("");

    let listener = match tokio::net::TcpListener::bind(&addr).await {
        Ok(listener) => listener,
        Err(e) => {
            error!("Failed to bind to {}: {}", addr, e);
            return ExitCode::FAILURE;
        }
    };

    if let Err(e) = axum::serve(listener, router).await {
        error!("Server error: {}", e);
        return ExitCode::FAILURE;
    }

    ExitCode::SUCCESS
}

/// Initialize the tracing/logging subsystem.
fn init_logging(verbose: bool) {
    let env_filter = if verbose {
        "iiif_delivery_router=debug,tower_http=debug"
    } else {
        "iiif_delivery_router=info,tower_http=info"
    };

    tracing_subscriber::registry()
        .with(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| env_filter.into()),
        )
        .with(tracing_subscriber::fmt::layer())
        .init();
}

/// Build RouterConfig from the application ServeConfig.
fn build_router_config(config: &ServeConfig) -> RouterConfig {
    let mut router_config = RouterConfig::new();

    if let Some(ref origins) = config.cors_origins {
        router_config = router_config.with_cors_origins(origins.clone());
    }

    router_config.with_tracing(!config.no_tracing)
}

// =============================================================================
// Sign Command
// =============================================================================

fn run_sign(config: SignConfig) -> ExitCode {
    if let Err(e) = config.validate() {
        eprintln!("Error: {}", e);
        return ExitCode::FAILURE;
    }

    let signer = AccessTokenSigner::new(&config.secret);
    let ttl = Duration::from_secs(config.ttl);
    let value = signer.cookie_value(config.customer, &config.roles, ttl);
    let name = config.cookie_name();

    match config.format {
        SignOutputFormat::Value => {
            println!("{}", value);
        }
        SignOutputFormat::Header => {
            println!("Cookie: {}={}", name, value);
        }
        SignOutputFormat::Json => {
            let json = serde_json::json!({
                "name": name,
                "value": value,
                "customer": config.customer,
                "roles": config.roles,
                "ttl": config.ttl,
            });
            match serde_json::to_string_pretty(&json) {
                Ok(text) => println!("{}", text),
                Err(e) => {
                    eprintln!("Error: {}", e);
                    return ExitCode::FAILURE;
                }
            }
        }
    }

    ExitCode::SUCCESS
}

// =============================================================================
// Check Command
// =============================================================================

fn run_check(config: CheckConfig) -> ExitCode {
    if config.verbose {
        init_logging(true);
    }

    println!("IIIF Delivery Router Configuration Check");
    println!("════════════════════════════════════════");
    println!();

    let image_servers = match config.load_image_server_config() {
        Ok(image_servers) => {
            match config.image_server_config {
                Some(ref path) => println!("✓ Image servers: {}", path.display()),
                None => println!("✓ Image servers: built-in defaults"),
            }
            image_servers
        }
        Err(e) => {
            println!("✗ Image servers: {}", e);
            return ExitCode::FAILURE;
        }
    };

    print_image_servers(&image_servers);

    let mut ok = true;
    for (role, server) in [("image", config.image_server), ("special", config.special_server)] {
        if image_servers.server(server).is_some() {
            println!("✓ {} server: {}", role, server);
        } else {
            println!("✗ {} server: {} is not configured", role, server);
            ok = false;
        }
    }
    println!();

    match config.load_metadata() {
        Ok(store) => {
            match config.metadata_file {
                Some(ref path) => println!("✓ Metadata: {}", path.display()),
                None => println!("✓ Metadata: none (every image request returns 404)"),
            }
            println!("  Customers: {}", store.customer_count());
            println!("  Assets: {}", store.asset_count());
            println!("  Header rules: {}", store.header_rule_count());
        }
        Err(e) => {
            println!("✗ Metadata: {}", e);
            ok = false;
        }
    }

    println!();
    println!("════════════════════════════════════════");
    if ok {
        println!("✓ All checks passed!");
        ExitCode::SUCCESS
    } else {
        println!("✗ Configuration has errors");
        ExitCode::FAILURE
    }
}

/// Print every backend with the versions it can serve.
fn print_image_servers(config: &ImageServerPathConfig) {
    let resolver = ImageServerPathResolver::new(config.clone());
    for (server, server_config) in config.servers() {
        println!("  {}", server);
        println!("    separator: {}", server_config.separator);
        println!("    path template: {}", server_config.path_template);
        for version in [ImageApiVersion::V1, ImageApiVersion::V2, ImageApiVersion::V3] {
            match resolver.resolve(server, version) {
                VersionResolution::Resolved {
                    version_template, ..
                } => println!("    {}: {}", version, version_template),
                VersionResolution::UnsupportedVersion | VersionResolution::UnknownServer => {}
            }
        }
    }
    println!();
}
