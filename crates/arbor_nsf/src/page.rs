//! Pages - fixed-size containers of raw pagelets
//!
//! ## Layout
//!
//! ```text
//! 0x00  u16  magic (0x1234)
//! 0x02  u16  type
//! 0x04  u32  content id
//! 0x08  u32  pagelet count (N)
//! 0x0C  u32  checksum
//! 0x10  u32  offset[0] ... offset[N]
//!       ...  pagelet payloads, back to back, zero padded to 64 KiB
//! ```
//!
//! Pagelet `i` spans `offset[i]..offset[i + 1]`. All fields are little-endian.

use crate::binio::{BinReader, BinWriter};
use crate::error::{ExportError, ImportError};
use arbor_core::Error;
use arbor_res::{Asset, AssetBase, AssetType, Property, RawData, Reference, TypeTag};
use arbor_transact::Transaction;
use std::ops::Range;

/// Size of every page in bytes
pub const PAGE_SIZE: usize = 0x10000;

/// Magic number at the start of every page
pub const PAGE_MAGIC: u16 = 0x1234;

/// Size of the fixed header fields
pub const HEADER_SIZE: usize = 16;

/// First byte after the header and an offset table for `count` pagelets
pub fn table_end(count: usize) -> usize {
    HEADER_SIZE + 4 * (count + 1)
}

/// The decoded contents of one page
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct PageContents {
    pub page_type: u16,
    pub cid: u32,
    /// Carried through verbatim
    pub checksum: u32,
    pub pagelets: Vec<Vec<u8>>,
}

impl PageContents {
    /// Parse and validate a page
    pub fn decode(data: &[u8]) -> Result<Self, ImportError> {
        let (header, ranges) = parse(data)?;
        Ok(Self {
            pagelets: ranges.into_iter().map(|range| data[range].to_vec()).collect(),
            ..header
        })
    }

    /// Serialize into exactly [`PAGE_SIZE`] bytes
    pub fn encode(&self) -> Result<Vec<u8>, ExportError> {
        let start = table_end(self.pagelets.len());
        let size = start + self.pagelets.iter().map(Vec::len).sum::<usize>();
        if size > PAGE_SIZE {
            return Err(ExportError::Oversize(size));
        }

        let mut w = BinWriter::with_capacity(PAGE_SIZE);
        w.write_u16(PAGE_MAGIC);
        w.write_u16(self.page_type);
        w.write_u32(self.cid);
        w.write_u32(self.pagelets.len() as u32);
        w.write_u32(self.checksum);

        let mut offset = start;
        for pagelet in &self.pagelets {
            w.write_u32(offset as u32);
            offset += pagelet.len();
        }
        w.write_u32(offset as u32);

        for pagelet in &self.pagelets {
            w.write_bytes(pagelet);
        }

        let mut page = w.finish();
        page.resize(PAGE_SIZE, 0);
        Ok(page)
    }
}

fn read_u16(r: &mut BinReader<'_>) -> Result<u16, ImportError> {
    let at = r.position();
    r.read_u16().ok_or(ImportError::Truncated(at))
}

fn read_u32(r: &mut BinReader<'_>) -> Result<u32, ImportError> {
    let at = r.position();
    r.read_u32().ok_or(ImportError::Truncated(at))
}

/// Validate the header and offset table. Returns the header fields (with
/// no pagelets) and each pagelet's byte range.
fn parse(data: &[u8]) -> Result<(PageContents, Vec<Range<usize>>), ImportError> {
    if data.len() != PAGE_SIZE {
        return Err(ImportError::BadSize(data.len()));
    }

    let mut r = BinReader::new(data);
    let magic = read_u16(&mut r)?;
    let page_type = read_u16(&mut r)?;
    let cid = read_u32(&mut r)?;
    let count = read_u32(&mut r)?;
    let checksum = read_u32(&mut r)?;

    if magic != PAGE_MAGIC {
        return Err(ImportError::BadMagic(magic));
    }

    // Checked in u64 so a huge count cannot overflow
    let min = HEADER_SIZE as u64 + 4 * (u64::from(count) + 1);
    if min > PAGE_SIZE as u64 {
        return Err(ImportError::TableOverrun { count });
    }
    let min = min as u32;

    let offsets = (0..=count)
        .map(|_| read_u32(&mut r))
        .collect::<Result<Vec<u32>, _>>()?;

    let mut ranges = Vec::with_capacity(count as usize);
    for (index, bounds) in offsets.windows(2).enumerate() {
        let (start, end) = (bounds[0], bounds[1]);
        if start < min {
            return Err(ImportError::PageletOutOfBounds { index, start, min });
        }
        if end as usize > PAGE_SIZE {
            return Err(ImportError::PageletTooLong { index, end });
        }
        if end < start {
            return Err(ImportError::NegativePageletSize { index, start, end });
        }
        ranges.push(start as usize..end as usize);
    }

    let header = PageContents {
        page_type,
        cid,
        checksum,
        pagelets: Vec::new(),
    };
    Ok((header, ranges))
}

/// A page asset. Its pagelets are [`RawData`] children named
/// `pagelet-<index>` under the page's own atom.
#[derive(Debug)]
pub struct Page {
    base: AssetBase,
    pub page_type: Property<u16>,
    pub cid: Property<u32>,
    pub checksum: Property<u32>,
    pub pagelets: Property<Vec<Reference<RawData>>>,
}

impl Asset for Page {
    fn base(&self) -> &AssetBase {
        &self.base
    }
}

impl AssetType for Page {
    const TYPE: TypeTag = TypeTag::new("nsf::spage");
    const TITLE: &'static str = "Page";

    fn construct(base: AssetBase) -> Self {
        Self {
            page_type: base.property("type", 0),
            cid: base.property("cid", 0),
            checksum: base.property("checksum", 0),
            pagelets: base.property("pagelets", Vec::new()),
            base,
        }
    }
}

impl Page {
    /// Stage an import of `data` into this page.
    ///
    /// The whole page is validated before anything is staged, so a
    /// malformed page leaves `tx` untouched. Each pagelet becomes a new
    /// [`RawData`] child; creating one where an asset already lives fails
    /// when `tx` commits.
    pub fn import_file(&self, tx: &Transaction, data: &[u8]) -> Result<(), ImportError> {
        let atom = self.base.atom();
        let (header, ranges) = parse(data).map_err(|err| {
            log::warn!("Rejected page import into {}: {}", atom, err);
            err
        })?;
        let ns = self
            .base
            .namespace()
            .ok_or_else(|| Error::AssetNotFound(atom.full_path()))?;

        let mut pagelets = Vec::with_capacity(ranges.len());
        for (index, range) in ranges.into_iter().enumerate() {
            let pagelet = ns.reference_at::<RawData>(&atom.child(&format!("pagelet-{index}")));
            let raw = pagelet.create(tx)?;
            raw.data.set(tx, data[range].to_vec())?;
            pagelets.push(pagelet);
        }

        log::debug!(
            "Staged import of {} (type {}, cid {:#x}, {} pagelets)",
            atom,
            header.page_type,
            header.cid,
            pagelets.len()
        );
        self.page_type.set(tx, header.page_type)?;
        self.cid.set(tx, header.cid)?;
        // TODO: validate and recompute the checksum once its algorithm is pinned down
        self.checksum.set(tx, header.checksum)?;
        self.pagelets.set(tx, pagelets)?;
        Ok(())
    }

    /// Read the committed page and its pagelets back into page bytes
    pub fn export_file(&self) -> Result<Vec<u8>, ExportError> {
        self.contents()?.encode().map_err(|err| {
            log::warn!("Rejected page export of {}: {}", self.base.atom(), err);
            err
        })
    }

    /// Gather the committed header and pagelet payloads
    pub fn contents(&self) -> Result<PageContents, ExportError> {
        let gone = || ExportError::AssetGone(self.base.atom().full_path());
        let ns = self.base.namespace().ok_or_else(gone)?;
        let _gate = ns.gate().read();
        if !self.base.is_alive() {
            return Err(gone());
        }

        let refs = self.pagelets.get();
        let mut pagelets = Vec::with_capacity(refs.len());
        for (index, pagelet) in refs.iter().enumerate() {
            match pagelet.resolve() {
                Some(raw) => pagelets.push(raw.data.get()),
                None if pagelet.get().is_some() => {
                    return Err(ExportError::IncompatiblePagelet {
                        index,
                        path: pagelet.full_path(),
                    })
                }
                None => {
                    return Err(ExportError::UnresolvedPagelet {
                        index,
                        path: pagelet.full_path(),
                    })
                }
            }
        }

        Ok(PageContents {
            page_type: self.page_type.get(),
            cid: self.cid.get(),
            checksum: self.checksum.get(),
            pagelets,
        })
    }
}
