//! Page import/export through the transaction nexus

use arbor_core::Error;
use arbor_nsf::{ExportError, ImportError, Page, PageContents, PAGE_SIZE};
use arbor_res::{Asset, Atom, Project, ProjectConfig, RawData, RefStatus};
use std::sync::Arc;

fn project() -> Project {
    Project::new(ProjectConfig::default(), arbor_nsf::registry())
}

fn sample() -> PageContents {
    PageContents {
        page_type: 3,
        cid: 0x0102_0304,
        checksum: 0xCAFE_BABE,
        pagelets: vec![b"first".to_vec(), vec![0xAB; 1000], Vec::new(), vec![7; 4096]],
    }
}

fn set_u32(page: &mut [u8], at: usize, value: u32) {
    page[at..at + 4].copy_from_slice(&value.to_le_bytes());
}

/// Create a page at `path` and import `data` into it, in one transaction
fn import(project: &Project, path: &str, data: &[u8]) -> Result<Arc<Page>, ImportError> {
    project.nexus().transact("Import page", |tx| {
        let page = project.reference::<Page>(path).create(tx)?;
        page.import_file(tx, data)?;
        Ok(page)
    })
}

/// Create an empty page at `path`
fn empty_page(project: &Project, path: &str) -> Arc<Page> {
    project
        .nexus()
        .transact("Create page", |tx| project.reference::<Page>(path).create(tx))
        .unwrap()
}

#[test]
fn round_trip_is_byte_identical() {
    let project = project();
    let data = sample().encode().unwrap();

    let page = import(&project, "level/page-0", &data).unwrap();

    assert_eq!(page.page_type.get(), 3);
    assert_eq!(page.cid.get(), 0x0102_0304);
    assert_eq!(page.checksum.get(), 0xCAFE_BABE);

    let pagelets = page.pagelets.get();
    assert_eq!(pagelets.len(), 4);
    assert_eq!(pagelets[0].full_path(), "level/page-0/pagelet-0");
    assert_eq!(pagelets[0].resolve().unwrap().data.get(), b"first".to_vec());
    assert!(pagelets[2].resolve().unwrap().is_empty());

    let exported = page.export_file().unwrap();
    assert_eq!(exported.len(), PAGE_SIZE);
    assert!(exported == data);
}

#[test]
fn overlong_pagelet_creates_nothing() {
    let project = project();
    let page = empty_page(&project, "p");
    let mut data = sample().encode().unwrap();
    // Last offset of the five-entry table
    set_u32(&mut data, 32, PAGE_SIZE as u32 + 1);

    let result = project
        .nexus()
        .transact("Import page", |tx| page.import_file(tx, &data));

    assert!(matches!(result, Err(ImportError::PageletTooLong { index: 3, .. })));
    assert!(project.namespace().children_of(&Atom::resolve("p")).is_empty());
    assert!(page.pagelets.get().is_empty());
    assert_eq!(project.nexus().undo_count(), 1);
}

#[test]
fn bad_magic_sets_no_header_property() {
    let project = project();
    let page = empty_page(&project, "p");
    project
        .nexus()
        .transact("Tag page", |tx| page.cid.set(tx, 77))
        .unwrap();

    let mut data = sample().encode().unwrap();
    data[0..2].copy_from_slice(&0x9999u16.to_le_bytes());

    let result = project
        .nexus()
        .transact("Import page", |tx| page.import_file(tx, &data));

    assert_eq!(result.unwrap_err(), ImportError::BadMagic(0x9999));
    assert_eq!(page.cid.get(), 77);
    assert_eq!(page.page_type.get(), 0);
    assert_eq!(page.checksum.get(), 0);
    assert_eq!(project.namespace().len(), 1);
}

#[test]
fn wrong_size_is_rejected() {
    let project = project();
    let result = import(&project, "p", &[0u8; 4096]);
    assert_eq!(result.unwrap_err(), ImportError::BadSize(4096));
    assert!(project.namespace().is_empty());
}

#[test]
fn import_over_existing_children_aborts() {
    let project = project();
    let data = sample().encode().unwrap();
    let page = import(&project, "p", &data).unwrap();

    let result = project
        .nexus()
        .transact("Import again", |tx| page.import_file(tx, &data));

    assert_eq!(
        result.unwrap_err(),
        ImportError::Core(Error::NameInUse("p/pagelet-0".into()))
    );
    assert_eq!(page.export_file().unwrap(), data);
}

#[test]
fn undo_removes_imported_pagelets() {
    let project = project();
    let page = empty_page(&project, "p");
    let data = sample().encode().unwrap();

    project
        .nexus()
        .transact("Import page", |tx| page.import_file(tx, &data))
        .unwrap();
    assert_eq!(project.namespace().len(), 5);

    project.nexus().undo().unwrap();
    assert_eq!(project.namespace().len(), 1);
    assert_eq!(page.cid.get(), 0);
    assert!(page.pagelets.get().is_empty());

    project.nexus().redo().unwrap();
    assert_eq!(page.export_file().unwrap(), data);
}

#[test]
fn export_reports_broken_pagelets() {
    let project = project();
    let data = sample().encode().unwrap();
    let page = import(&project, "p", &data).unwrap();
    let ns = project.namespace();

    // Replace pagelet 1 with a page
    project
        .nexus()
        .transact("Retype", |tx| {
            ns.destroy_at(tx, &Atom::resolve("p/pagelet-1"))?;
            ns.create::<Page>(tx, &Atom::resolve("p/pagelet-1"))?;
            Ok::<_, Error>(())
        })
        .unwrap();
    assert_eq!(page.pagelets.get()[1].status(), RefStatus::WrongType);
    assert_eq!(
        page.export_file().unwrap_err(),
        ExportError::IncompatiblePagelet {
            index: 1,
            path: "p/pagelet-1".into()
        }
    );

    project.nexus().undo().unwrap();
    project
        .nexus()
        .transact("Drop pagelet", |tx| ns.destroy_at(tx, &Atom::resolve("p/pagelet-3")))
        .unwrap();
    assert_eq!(
        page.export_file().unwrap_err(),
        ExportError::UnresolvedPagelet {
            index: 3,
            path: "p/pagelet-3".into()
        }
    );
}

#[test]
fn oversize_export_fails() {
    let project = project();
    let page = empty_page(&project, "p");
    let blob = project.reference::<RawData>("p/big");

    project
        .nexus()
        .transact("Grow", |tx| {
            let raw = blob.create(tx)?;
            raw.data.set(tx, vec![1; PAGE_SIZE])?;
            page.pagelets.set(tx, vec![blob.clone()])
        })
        .unwrap();

    assert_eq!(
        page.export_file().unwrap_err(),
        ExportError::Oversize(PAGE_SIZE + 24)
    );
}

#[test]
fn destroyed_page_cannot_export() {
    let project = project();
    let page = empty_page(&project, "p");
    project
        .nexus()
        .transact("Delete", |tx| project.reference::<Page>("p").destroy(tx))
        .unwrap();

    assert_eq!(
        page.export_file().unwrap_err(),
        ExportError::AssetGone("p".into())
    );
}

#[test]
fn closing_project_frees_imported_pages() {
    let project = project();
    let data = PageContents {
        pagelets: vec![b"only".to_vec()],
        ..sample()
    }
    .encode()
    .unwrap();
    let page = import(&project, "p", &data).unwrap();
    let raw = page.pagelets.get()[0].resolve().unwrap();
    let pagelet = page.pagelets.get()[0].clone();

    drop(page);
    project.nexus().clear_history().unwrap();
    drop(project);

    assert!(raw.base().namespace().is_none());
    assert!(pagelet.namespace().is_none());
    assert_eq!(pagelet.status(), RefStatus::Absent);
}
