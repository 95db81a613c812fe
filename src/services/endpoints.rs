use serde::Deserialize;
use url::Url;

/// Which generation of the server's admin endpoints to talk to.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Layout {
    /// Per-application `__application__`/`__signature__`/`__test_run__` handlers.
    #[default]
    Modern,
    /// Everything served by the dwm application under `/dwm/...`.
    Legacy,
}

/// URL builder for every endpoint the console consumes.
#[derive(Debug, Clone)]
pub struct Endpoints {
    server: String,
    console_path: String,
    pub layout: Layout,
}

impl Endpoints {
    pub fn new(server: &str, console_path: &str, layout: Layout) -> Self {
        let console_path = console_path.trim_end_matches('/');
        let console_path = if console_path.is_empty() || console_path.starts_with('/') {
            console_path.to_string()
        } else {
            format!("/{console_path}")
        };
        Self {
            server: server.trim_end_matches('/').to_string(),
            console_path,
            layout,
        }
    }

    fn join(&self, path: &str) -> String {
        if path.starts_with("http://") || path.starts_with("https://") {
            return path.to_string();
        }
        if path.starts_with('/') {
            format!("{}{}", self.server, path)
        } else {
            format!("{}/{}", self.server, path)
        }
    }

    fn with_query(&self, path: &str, params: &[(&str, &str)]) -> String {
        let base = self.join(path);
        match Url::parse(&base) {
            Ok(mut u) => {
                {
                    let mut q = u.query_pairs_mut();
                    for (k, v) in params {
                        q.append_pair(k, v);
                    }
                }
                u.to_string()
            }
            // Relative or malformed server: fall back to plain encoding
            Err(_) => {
                let query: String = url::form_urlencoded::Serializer::new(String::new())
                    .extend_pairs(params.iter())
                    .finish();
                format!("{base}?{query}")
            }
        }
    }

    pub fn applications(&self) -> String {
        match self.layout {
            Layout::Modern => self.join(&format!("{}/applications", self.console_path)),
            Layout::Legacy => self.join("/dwm/applications"),
        }
    }

    pub fn application(&self, url_prefix: &str) -> String {
        match self.layout {
            Layout::Modern => self.join(&format!("{url_prefix}/__application__")),
            Layout::Legacy => self.join("/dwm/applications"),
        }
    }

    pub fn signature(&self, url_prefix: &str, module_url: &str) -> String {
        match self.layout {
            Layout::Modern => {
                self.with_query(&format!("{url_prefix}/__signature__"), &[("url", module_url)])
            }
            Layout::Legacy => self.with_query("/dwm/signature", &[("url", module_url)]),
        }
    }

    pub fn module(&self, module_url: &str) -> String {
        self.join(module_url)
    }

    pub fn test_run(&self, url_prefix: &str, module_url: &str, name: Option<&str>) -> String {
        match (self.layout, name) {
            (Layout::Modern, Some(n)) => self.with_query(
                &format!("{url_prefix}/__test_run__"),
                &[("url", module_url), ("name", n)],
            ),
            (Layout::Modern, None) => self.with_query(
                &format!("{url_prefix}/__test_run_all__"),
                &[("url", module_url)],
            ),
            (Layout::Legacy, Some(n)) => {
                self.with_query("/dwm/testing/run", &[("url", module_url), ("name", n)])
            }
            (Layout::Legacy, None) => {
                self.with_query("/dwm/testing/run_all", &[("url", module_url)])
            }
        }
    }
}
