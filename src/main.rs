use clap::Parser;
use log::info;
use pure_xml_view::cli::Args;
use pure_xml_view::config::RcLoader;
use pure_xml_view::controller::{ELEMENT_NAME, ViewerSession, XmlView, register_element};
use pure_xml_view::view::TreeRenderer;
use pure_xml_view::{AppError, init_logging, print_html, print_tree, settings_summary};
use std::io::{self, IsTerminal};

fn main() -> Result<(), Box<dyn std::error::Error>> {
    let args = Args::parse();

    // Load RC configuration, then let flags override it
    let mut config = RcLoader::load_config();
    args.apply_to(&mut config);

    if let Some(log_file) = &args.log_file {
        init_logging(log_file, config.log_level)?;
        info!(
            "{}",
            settings_summary(&config, RcLoader::get_rc_path().as_deref())
        );
    }

    register_element(ELEMENT_NAME);

    let text = args.read_input().map_err(AppError::Input)?;
    let mut view = XmlView::with_renderer(TreeRenderer::with_max_depth(config.max_depth));
    view.set_data(text);
    if config.start_collapsed {
        view.collapse_all();
    }

    let title = args
        .source_path()
        .map(|path| path.display().to_string())
        .unwrap_or_else(|| "stdin".to_string());

    let stdout = io::stdout();
    if args.html {
        print_html(&mut stdout.lock(), &view, &title)?;
        return Ok(());
    }

    // piped output or piped input leaves no terminal to drive
    let piped_input = args.source_path().is_none() && !io::stdin().is_terminal();
    if args.print || piped_input || !stdout.is_terminal() {
        print_tree(&mut stdout.lock(), &view, &config)?;
        return Ok(());
    }

    info!("starting interactive viewer for {title}");
    let session = ViewerSession::new(view, args.source_path().map(|p| p.to_path_buf()), &config);
    session.run()
}
