use std::cell::RefCell;
use std::fmt;
use std::path::Path;
use std::process::ExitCode;
use std::rc::Rc;

use browser::{Page, PageConfig};
use clap::Parser;
use mimalloc::MiMalloc;
use net::{NetError, Request};
use query::{Query, QueryError};
use url::Url;

#[global_allocator]
static GLOBAL: MiMalloc = MiMalloc;

const OUTLINE_CAP: usize = 200;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum Output {
    Text,
    Html,
    Outline,
}

#[derive(Parser, Debug)]
#[command(
    name = "myquery",
    about = "Load a page and print the first element matching a CSS selector",
    version
)]
struct Args {
    /// HTML file path or http(s) URL
    source: String,
    /// CSS selector; the first match in document order is printed
    selector: String,
    /// Print the element's outer HTML instead of its text
    #[arg(long, conflicts_with = "outline")]
    html: bool,
    /// Print an indented outline of the element's subtree
    #[arg(long)]
    outline: bool,
}

impl Args {
    fn output(&self) -> Output {
        if self.html {
            Output::Html
        } else if self.outline {
            Output::Outline
        } else {
            Output::Text
        }
    }
}

#[derive(Debug)]
enum CliError {
    Io { path: String, error: std::io::Error },
    Net(NetError),
    Status { url: String, status: u16 },
    Query(QueryError),
}

impl fmt::Display for CliError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            CliError::Io { path, error } => write!(f, "cannot read {path}: {error}"),
            CliError::Net(err) => write!(f, "{err}"),
            CliError::Status { url, status } => write!(f, "{url} answered {status}"),
            CliError::Query(err) => write!(f, "{err}"),
        }
    }
}

impl From<QueryError> for CliError {
    fn from(err: QueryError) -> Self {
        CliError::Query(err)
    }
}

fn main() -> ExitCode {
    let args = Args::parse();
    env_logger::Builder::from_env(env_logger::Env::default().default_filter_or("warn")).init();

    match run(&args) {
        Ok(()) => ExitCode::SUCCESS,
        Err(err) => {
            eprintln!("myquery: {err}");
            ExitCode::FAILURE
        }
    }
}

fn run(args: &Args) -> Result<(), CliError> {
    let page = if is_url(&args.source) {
        load_url(&args.source)?
    } else {
        load_file(&args.source)?
    };
    page.run_until_idle();

    let q = Query::new(page);
    let matches = {
        let doc = q.page().document();
        doc.query_selector_all(doc.root(), &args.selector)
            .map_err(QueryError::from)?
            .len()
    };
    log::info!("{matches} element(s) match {:?}", args.selector);

    let el = q.select(&args.selector)?;
    match args.output() {
        Output::Text => println!("{}", el.text().trim()),
        Output::Html => {
            let doc = q.page().document();
            println!("{}", doc.outer_html(el.node()).unwrap_or_default());
        }
        Output::Outline => {
            let doc = q.page().document();
            for line in html::dom_utils::outline(&doc, el.node(), OUTLINE_CAP) {
                println!("{line}");
            }
        }
    }
    Ok(())
}

fn is_url(source: &str) -> bool {
    source.starts_with("http://") || source.starts_with("https://")
}

fn load_file(path: &str) -> Result<Page, CliError> {
    let markup = std::fs::read_to_string(path).map_err(|error| CliError::Io {
        path: path.to_string(),
        error,
    })?;
    let base_url = std::fs::canonicalize(Path::new(path))
        .ok()
        .and_then(|abs| Url::from_file_path(abs).ok());
    let config = PageConfig {
        base_url,
        ..PageConfig::default()
    };
    Ok(Page::from_html(&markup, config))
}

fn load_url(source: &str) -> Result<Page, CliError> {
    let config = PageConfig {
        base_url: Url::parse(source).ok(),
        ..PageConfig::default()
    };
    let page = Page::new(config);
    let outcome: Rc<RefCell<Option<Result<(), CliError>>>> = Rc::new(RefCell::new(None));

    let slot = Rc::clone(&outcome);
    page.fetch(Request::get(source), move |page, result| {
        let done = match result {
            Ok(resp) if !resp.is_success() => Err(CliError::Status {
                url: resp.url,
                status: resp.status,
            }),
            Ok(resp) => {
                if resp.content_type.is_some() && !html::is_html(resp.content_type.as_deref()) {
                    log::warn!(
                        "{} is {}, parsing it as HTML anyway",
                        resp.url,
                        resp.content_type.as_deref().unwrap_or_default()
                    );
                }
                page.load_html(&resp.body);
                Ok(())
            }
            Err(err) => Err(CliError::Net(err)),
        };
        *slot.borrow_mut() = Some(done);
    });
    page.run_until_idle();

    let done = outcome.borrow_mut().take();
    match done {
        Some(Ok(())) => Ok(page),
        Some(Err(err)) => Err(err),
        None => Err(CliError::Net(NetError::Client(
            "request never completed".to_string(),
        ))),
    }
}
