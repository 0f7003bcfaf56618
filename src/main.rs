#![cfg_attr(not(debug_assertions), windows_subsystem = "windows")] // hide console window on Windows in release

use eframe::egui;
use homelab_launcher::app::HomelabLauncher;
use homelab_launcher::logging::init_tracing;
use homelab_launcher::logic::{HttpPingApi, LauncherConfig, PING_API_GRACE, Prober, server};
use tr::tr;
#[cfg(not(windows))]
use tr::tr_init;
use tracing::{error, info, warn};

fn main() -> eframe::Result {
    init_tracing();

    let config = match LauncherConfig::from_env() {
        Ok(config) => config,
        Err(err) => {
            error!(error = %err, "invalid configuration");
            std::process::exit(2);
        }
    };

    let runtime = match tokio::runtime::Builder::new_multi_thread()
        .enable_all()
        .thread_name("launcher-worker")
        .build()
    {
        Ok(runtime) => runtime,
        Err(err) => {
            error!(error = %err, "failed to start async runtime");
            std::process::exit(1);
        }
    };

    #[cfg(not(windows))]
    tr_init!("./locales");

    // Runs even with live status off; the toggle may enable polling later
    let api_warning = match runtime.block_on(server::bind(config.bind_addr)) {
        Ok((listener, _)) => {
            let prober = Prober::with_reqwest(config.probe_timeout);
            runtime.spawn(async move {
                if let Err(err) = server::serve(listener, prober).await {
                    error!(error = %err, "embedded ping API stopped");
                }
            });
            None
        }
        Err(err) => {
            warn!(error = %err, "embedded ping API not started");
            // Another launcher may already serve this address
            let api = HttpPingApi::new(config.api_base_url.clone())
                .with_request_timeout(config.probe_timeout + PING_API_GRACE);
            match runtime.block_on(api.check_health()) {
                Ok(()) => {
                    info!(api = api.base_url(), "using ping API that is already running");
                    None
                }
                Err(err) => {
                    warn!(
                        api = api.base_url(),
                        error = %err,
                        "no ping API reachable, live status will show unknown"
                    );
                    Some(tr!(
                        "Live status unavailable: no ping API answers at the configured address."
                    ))
                }
            }
        }
    };
    if !config.ping_enabled {
        info!("live status starts disabled");
    }

    let options = eframe::NativeOptions {
        viewport: egui::ViewportBuilder::default()
            .with_title(tr!("Homelab Launcher"))
            .with_inner_size([1100.0, 720.0])
            .with_resizable(true),
        renderer: eframe::Renderer::Wgpu,
        ..Default::default()
    };

    let handle = runtime.handle().clone();
    eframe::run_native(
        "homelab_launcher",
        options,
        Box::new(move |cc| {
            let mut app = HomelabLauncher::new(cc, handle, &config);
            if let Some(warning) = api_warning {
                app = app.with_api_warning(warning);
            }
            Ok(Box::new(app))
        }),
    )
}
