//! Shell commands
//!
//! Each command imports one page file into a fresh project and reports on
//! the result. Reports are plain values with a `Display` impl so `main`
//! only prints.

use crate::config::ShellConfig;
use crate::error::{Result, ShellError};
use arbor_nsf::{Page, PAGE_SIZE};
use arbor_res::{Asset, Atom, Namespace, Project, RefStatus};
use std::fmt;
use std::path::Path;
use std::sync::Arc;

/// A project holding imported pages
pub struct Session {
    config: ShellConfig,
    project: Project,
}

impl Session {
    /// Open an empty project
    pub fn new(config: ShellConfig) -> Self {
        let project = Project::new(config.project(), arbor_nsf::registry());
        Self { config, project }
    }

    /// The project pages are imported into
    pub fn project(&self) -> &Project {
        &self.project
    }

    /// Atom a page called `name` is imported at
    pub fn page_atom(&self, name: &str) -> Atom {
        Atom::resolve(&self.config.page_root).child(name)
    }

    /// Import page bytes as `<page_root>/<name>` in one transaction
    pub fn import(&self, name: &str, data: &[u8]) -> Result<Arc<Page>> {
        let reference = self.project.namespace().reference_at::<Page>(&self.page_atom(name));
        let page = self
            .project
            .nexus()
            .transact(format!("Import {}", name), |tx| {
                let page = reference.create(tx)?;
                page.import_file(tx, data)?;
                Ok::<_, ShellError>(page)
            })?;
        log::info!(
            "Imported {} ({} pagelets)",
            reference.full_path(),
            page.pagelets.get().len()
        );
        Ok(page)
    }

    /// Read a page file and import it under its file stem
    pub fn import_path(&self, path: &Path) -> Result<Arc<Page>> {
        let data = std::fs::read(path).map_err(|source| ShellError::Read {
            path: path.to_path_buf(),
            source,
        })?;
        let name = path
            .file_stem()
            .and_then(|stem| stem.to_str())
            .filter(|stem| !stem.is_empty())
            .unwrap_or("page");
        self.import(name, &data)
    }
}

/// One row of a page's pagelet table
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct PageletRow {
    pub path: String,
    pub status: RefStatus,
    pub len: Option<usize>,
}

/// Header and pagelet table of an imported page
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct PageReport {
    pub path: String,
    pub page_type: u16,
    pub cid: u32,
    pub checksum: u32,
    pub pagelets: Vec<PageletRow>,
}

impl PageReport {
    pub fn of(page: &Page) -> Self {
        let pagelets = page
            .pagelets
            .get()
            .iter()
            .map(|pagelet| PageletRow {
                path: pagelet.full_path(),
                status: pagelet.status(),
                len: pagelet.resolve().map(|raw| raw.len()),
            })
            .collect();

        Self {
            path: page.base().atom().full_path(),
            page_type: page.page_type.get(),
            cid: page.cid.get(),
            checksum: page.checksum.get(),
            pagelets,
        }
    }
}

impl fmt::Display for PageReport {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        writeln!(f, "{}", self.path)?;
        writeln!(f, "  type      {}", self.page_type)?;
        writeln!(f, "  cid       {:#010x}", self.cid)?;
        writeln!(f, "  checksum  {:#010x}", self.checksum)?;
        writeln!(f, "  pagelets  {}", self.pagelets.len())?;
        for (index, row) in self.pagelets.iter().enumerate() {
            let len = row.len.map(|len| format!("{} bytes", len)).unwrap_or_default();
            writeln!(f, "  [{:3}] {:<40} {:<12} {}", index, row.path, row.status, len)?;
        }
        Ok(())
    }
}

/// Indented listing of a namespace subtree
pub struct TreeView<'a> {
    namespace: &'a Namespace,
    root: Atom,
}

impl<'a> TreeView<'a> {
    pub fn new(namespace: &'a Namespace, root: Atom) -> Self {
        Self { namespace, root }
    }

    fn write_node(&self, f: &mut fmt::Formatter<'_>, atom: &Atom, depth: usize) -> fmt::Result {
        let kind = match self.namespace.asset_at(atom) {
            Some(asset) => self.namespace.registry().title(asset.base().tag()),
            None => "-",
        };
        writeln!(f, "{:indent$}{} [{}]", "", atom.name(), kind, indent = depth * 2)?;
        for child in self.namespace.branches_of(atom) {
            self.write_node(f, &child, depth + 1)?;
        }
        Ok(())
    }
}

impl fmt::Display for TreeView<'_> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        self.write_node(f, &self.root, 0)
    }
}

/// Outcome of re-exporting an imported page
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RoundTrip {
    pub exported: Vec<u8>,
    /// First byte where the export differs from the input
    pub first_difference: Option<usize>,
}

impl RoundTrip {
    /// Export `page` and compare it against the bytes it was imported from
    pub fn run(page: &Page, original: &[u8]) -> Result<Self> {
        let exported = page.export_file()?;
        let first_difference = exported
            .iter()
            .zip(original)
            .position(|(a, b)| a != b)
            .or_else(|| (exported.len() != original.len()).then(|| exported.len().min(original.len())));
        Ok(Self {
            exported,
            first_difference,
        })
    }

    pub fn is_identical(&self) -> bool {
        self.first_difference.is_none()
    }
}

impl fmt::Display for RoundTrip {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self.first_difference {
            None => write!(f, "identical ({} bytes)", PAGE_SIZE),
            Some(at) => write!(f, "differs at byte {:#06x}", at),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use arbor_nsf::PageContents;

    fn sample() -> Vec<u8> {
        PageContents {
            page_type: 2,
            cid: 0x42,
            checksum: 0x1111_2222,
            pagelets: vec![b"alpha".to_vec(), b"beta".to_vec()],
        }
        .encode()
        .unwrap()
    }

    #[test]
    fn test_import_under_page_root() {
        let session = Session::new(ShellConfig::default());
        let page = session.import("town", &sample()).unwrap();

        assert_eq!(page.base().atom().full_path(), "pages/town");
        assert_eq!(session.project().nexus().undo_labels(), vec!["Import town".to_string()]);
    }

    #[test]
    fn test_failed_import_leaves_project_empty() {
        let session = Session::new(ShellConfig::default());
        let mut data = sample();
        data[0] = 0;

        assert!(matches!(
            session.import("bad", &data),
            Err(ShellError::Import(_))
        ));
        assert!(session.project().namespace().is_empty());
        assert!(!session.project().nexus().can_undo());
    }

    #[test]
    fn test_page_report() {
        let session = Session::new(ShellConfig::default());
        let page = session.import("town", &sample()).unwrap();
        let report = PageReport::of(&page);

        assert_eq!(report.cid, 0x42);
        assert_eq!(report.checksum, 0x1111_2222);
        assert_eq!(
            report.pagelets[1],
            PageletRow {
                path: "pages/town/pagelet-1".into(),
                status: RefStatus::Ok,
                len: Some(4),
            }
        );
        let text = report.to_string();
        assert!(text.starts_with("pages/town\n"));
        assert!(text.contains("pagelets  2"));
    }

    #[test]
    fn test_tree_view() {
        let session = Session::new(ShellConfig::default());
        session.import("town", &sample()).unwrap();

        let tree = TreeView::new(session.project().namespace(), session.page_atom("town"));
        assert_eq!(
            tree.to_string(),
            "town [Page]\n  pagelet-0 [Raw Data]\n  pagelet-1 [Raw Data]\n"
        );
    }

    #[test]
    fn test_round_trip() {
        let session = Session::new(ShellConfig::default());
        let data = sample();
        let page = session.import("town", &data).unwrap();

        let result = RoundTrip::run(&page, &data).unwrap();
        assert!(result.is_identical());

        let mut altered = data.clone();
        altered[100] ^= 0xFF;
        let result = RoundTrip::run(&page, &altered).unwrap();
        assert_eq!(result.first_difference, Some(100));
        assert_eq!(result.to_string(), "differs at byte 0x0064");
    }
}
