//! Builds complete bigWig images in memory for the reader tests.
//!
//! The layout mirrors a real file: fixed header, zoom table, total summary,
//! chromosome B+-tree, data section, and the R-tree index last. Blocks are
//! grouped into index leaves as given; supply them in ascending genomic
//! order, as a writer would.

use std::io::Write;

use byteordered::{ByteOrdered, Endianness};
use libdeflater::{CompressionLvl, Compressor};

const BIGWIG_MAGIC: u32 = 0x888F_FC26;
const CHROM_TREE_MAGIC: u32 = 0x78CA_8C91;
const CIR_TREE_MAGIC: u32 = 0x2468_ACE0;

pub struct FileSpec {
    pub endianness: Endianness,
    pub compressed: bool,
    /// Overrides the declared decompression buffer size; `None` sizes it to
    /// the largest block payload.
    pub uncompress_buf_size: Option<u32>,
    pub zooms: Vec<u32>,
    pub chroms: Vec<(&'static str, u32)>,
    pub leaves: Vec<Vec<BlockSpec>>,
}

impl FileSpec {
    pub fn new(chroms: Vec<(&'static str, u32)>, leaves: Vec<Vec<BlockSpec>>) -> FileSpec {
        FileSpec {
            endianness: Endianness::Little,
            compressed: true,
            uncompress_buf_size: None,
            zooms: vec![],
            chroms,
            leaves,
        }
    }
}

pub struct BlockSpec {
    pub chrom_id: u32,
    pub start: u32,
    pub end: u32,
    pub step: u32,
    pub span: u32,
    pub section_type: u8,
    /// Full (start, end, value) records; encoding picks the stored fields by
    /// section type.
    pub records: Vec<(u32, u32, f32)>,
    /// Overrides the leaf item bounding box, e.g. to straddle a chromosome
    /// boundary.
    pub bounds: Option<(u32, u32, u32, u32)>,
}

impl BlockSpec {
    pub fn bedgraph(chrom_id: u32, records: Vec<(u32, u32, f32)>) -> BlockSpec {
        let start = records.first().map_or(0, |r| r.0);
        let end = records.last().map_or(0, |r| r.1);
        BlockSpec {
            chrom_id,
            start,
            end,
            step: 0,
            span: 0,
            section_type: 1,
            records,
            bounds: None,
        }
    }

    pub fn variable_step(chrom_id: u32, span: u32, points: Vec<(u32, f32)>) -> BlockSpec {
        let records: Vec<_> = points.iter().map(|&(s, v)| (s, s + span, v)).collect();
        let start = records.first().map_or(0, |r| r.0);
        let end = records.last().map_or(0, |r| r.1);
        BlockSpec {
            chrom_id,
            start,
            end,
            step: 0,
            span,
            section_type: 2,
            records,
            bounds: None,
        }
    }

    pub fn fixed_step(chrom_id: u32, start: u32, step: u32, span: u32, values: Vec<f32>) -> BlockSpec {
        let records: Vec<_> = values
            .iter()
            .enumerate()
            .map(|(i, &v)| {
                let s = start + i as u32 * step;
                (s, s + span, v)
            })
            .collect();
        let end = records.last().map_or(start, |r| r.1);
        BlockSpec {
            chrom_id,
            start,
            end,
            step,
            span,
            section_type: 3,
            records,
            bounds: None,
        }
    }

    pub fn with_bounds(mut self, bounds: (u32, u32, u32, u32)) -> BlockSpec {
        self.bounds = Some(bounds);
        self
    }

    fn item_bounds(&self) -> (u32, u32, u32, u32) {
        self.bounds
            .unwrap_or((self.chrom_id, self.start, self.chrom_id, self.end))
    }
}

pub fn build(spec: &FileSpec) -> Vec<u8> {
    let endianness = spec.endianness;

    let payloads: Vec<Vec<Vec<u8>>> = spec
        .leaves
        .iter()
        .map(|leaf| leaf.iter().map(|b| encode_block(b, endianness)).collect())
        .collect();
    let max_payload = payloads
        .iter()
        .flatten()
        .map(|p| p.len())
        .max()
        .unwrap_or(0);
    let uncompress_buf_size = if spec.compressed {
        spec.uncompress_buf_size.unwrap_or(max_payload as u32)
    } else {
        0
    };
    let stored: Vec<Vec<Vec<u8>>> = if spec.compressed {
        let mut compressor = Compressor::new(CompressionLvl::default());
        payloads
            .iter()
            .map(|leaf| {
                leaf.iter()
                    .map(|p| {
                        let mut out = vec![0u8; compressor.zlib_compress_bound(p.len())];
                        let n = compressor.zlib_compress(p, &mut out).unwrap();
                        out.truncate(n);
                        out
                    })
                    .collect()
            })
            .collect()
    } else {
        payloads
    };

    let total_summary_offset = 64 + spec.zooms.len() as u64 * 24;
    let chromosome_tree_offset = total_summary_offset + 40;
    let chrom_tree = encode_chrom_tree(&spec.chroms, endianness);
    let full_data_offset = chromosome_tree_offset + chrom_tree.len() as u64;

    let total_records: u64 = spec
        .leaves
        .iter()
        .flatten()
        .map(|b| b.records.len() as u64)
        .sum();
    let mut data_section = ByteOrdered::runtime(Vec::new(), endianness);
    data_section.write_u64(total_records).unwrap();
    let mut data_section = data_section.into_inner();
    let mut block_locs: Vec<Vec<(u64, u64)>> = Vec::new();
    for leaf in &stored {
        let mut locs = Vec::new();
        for block in leaf {
            let offset = full_data_offset + data_section.len() as u64;
            locs.push((offset, block.len() as u64));
            data_section.extend_from_slice(block);
        }
        block_locs.push(locs);
    }
    let full_index_offset = full_data_offset + data_section.len() as u64;

    let index = encode_index(spec, &block_locs, full_index_offset, endianness);

    let mut image = ByteOrdered::runtime(Vec::new(), endianness);
    image.write_u32(BIGWIG_MAGIC).unwrap();
    image.write_u16(4).unwrap(); // version
    image.write_u16(spec.zooms.len() as u16).unwrap();
    image.write_u64(chromosome_tree_offset).unwrap();
    image.write_u64(full_data_offset).unwrap();
    image.write_u64(full_index_offset).unwrap();
    image.write_u16(0).unwrap(); // field count
    image.write_u16(0).unwrap(); // defined field count
    image.write_u64(0).unwrap(); // auto sql offset
    image.write_u64(total_summary_offset).unwrap();
    image.write_u32(uncompress_buf_size).unwrap();
    image.write_u64(0).unwrap(); // reserved
    for reduction_level in &spec.zooms {
        image.write_u32(*reduction_level).unwrap();
        image.write_u32(0).unwrap();
        image.write_u64(0).unwrap();
        image.write_u64(0).unwrap();
    }
    write_summary(&mut image, spec);

    let mut image = image.into_inner();
    image.extend_from_slice(&chrom_tree);
    image.extend_from_slice(&data_section);
    image.extend_from_slice(&index);
    image
}

fn encode_block(block: &BlockSpec, endianness: Endianness) -> Vec<u8> {
    let mut out = ByteOrdered::runtime(Vec::new(), endianness);
    out.write_u32(block.chrom_id).unwrap();
    out.write_u32(block.start).unwrap();
    out.write_u32(block.end).unwrap();
    out.write_u32(block.step).unwrap();
    out.write_u32(block.span).unwrap();
    out.write_u8(block.section_type).unwrap();
    out.write_u8(0).unwrap();
    out.write_u16(block.records.len() as u16).unwrap();
    for &(start, end, value) in &block.records {
        match block.section_type {
            1 => {
                out.write_u32(start).unwrap();
                out.write_u32(end).unwrap();
                out.write_f32(value).unwrap();
            }
            2 => {
                out.write_u32(start).unwrap();
                out.write_f32(value).unwrap();
            }
            3 => {
                out.write_f32(value).unwrap();
            }
            other => panic!("unsupported section type {}", other),
        }
    }
    out.into_inner()
}

fn encode_chrom_tree(chroms: &[(&'static str, u32)], endianness: Endianness) -> Vec<u8> {
    let key_size = chroms.iter().map(|(name, _)| name.len()).max().unwrap_or(1) as u32;
    let mut out = ByteOrdered::runtime(Vec::new(), endianness);
    out.write_u32(CHROM_TREE_MAGIC).unwrap();
    out.write_u32(256).unwrap(); // block size
    out.write_u32(key_size).unwrap();
    out.write_u32(8).unwrap(); // val size
    out.write_u64(chroms.len() as u64).unwrap();
    out.write_u64(0).unwrap(); // reserved
    out.write_u8(1).unwrap(); // leaf
    out.write_u8(0).unwrap();
    out.write_u16(chroms.len() as u16).unwrap();
    for (id, (name, length)) in chroms.iter().enumerate() {
        let mut key = vec![0u8; key_size as usize];
        key[..name.len()].copy_from_slice(name.as_bytes());
        out.write_all(&key).unwrap();
        out.write_u32(id as u32).unwrap();
        out.write_u32(*length).unwrap();
    }
    out.into_inner()
}

fn encode_index(
    spec: &FileSpec,
    block_locs: &[Vec<(u64, u64)>],
    full_index_offset: u64,
    endianness: Endianness,
) -> Vec<u8> {
    let leaf_bounds: Vec<(u32, u32, u32, u32)> = spec
        .leaves
        .iter()
        .map(|leaf| {
            let mut bounds = leaf.iter().map(|b| b.item_bounds());
            let first = bounds.next().expect("leaf must hold at least one block");
            bounds.fold(first, |acc, b| {
                let (start_chrom, start_base) = std::cmp::min((acc.0, acc.1), (b.0, b.1));
                let (end_chrom, end_base) = std::cmp::max((acc.2, acc.3), (b.2, b.3));
                (start_chrom, start_base, end_chrom, end_base)
            })
        })
        .collect();
    let global = leaf_bounds
        .iter()
        .copied()
        .reduce(|acc, b| {
            let (start_chrom, start_base) = std::cmp::min((acc.0, acc.1), (b.0, b.1));
            let (end_chrom, end_base) = std::cmp::max((acc.2, acc.3), (b.2, b.3));
            (start_chrom, start_base, end_chrom, end_base)
        })
        .unwrap_or((0, 0, 0, 0));

    let total_blocks: u64 = spec.leaves.iter().map(|l| l.len() as u64).sum();
    let multi_leaf = spec.leaves.len() > 1;
    let root_offset = full_index_offset + 48;
    let twig_len = if multi_leaf {
        4 + spec.leaves.len() as u64 * 24
    } else {
        0
    };
    let leaf_len = |leaf: &Vec<BlockSpec>| 4 + leaf.len() as u64 * 32;
    let end_file_offset = root_offset
        + twig_len
        + spec.leaves.iter().map(leaf_len).sum::<u64>();

    let mut out = ByteOrdered::runtime(Vec::new(), endianness);
    out.write_u32(CIR_TREE_MAGIC).unwrap();
    out.write_u32(256).unwrap(); // block size
    out.write_u64(total_blocks).unwrap();
    out.write_u32(global.0).unwrap();
    out.write_u32(global.1).unwrap();
    out.write_u32(global.2).unwrap();
    out.write_u32(global.3).unwrap();
    out.write_u64(end_file_offset).unwrap();
    out.write_u32(512).unwrap(); // items per leaf
    out.write_u32(0).unwrap(); // reserved

    if multi_leaf {
        out.write_u8(0).unwrap();
        out.write_u8(0).unwrap();
        out.write_u16(spec.leaves.len() as u16).unwrap();
        let mut child_offset = root_offset + twig_len;
        for (leaf, bounds) in spec.leaves.iter().zip(&leaf_bounds) {
            out.write_u32(bounds.0).unwrap();
            out.write_u32(bounds.1).unwrap();
            out.write_u32(bounds.2).unwrap();
            out.write_u32(bounds.3).unwrap();
            out.write_u64(child_offset).unwrap();
            child_offset += leaf_len(leaf);
        }
    }

    for (leaf, locs) in spec.leaves.iter().zip(block_locs) {
        out.write_u8(1).unwrap();
        out.write_u8(0).unwrap();
        out.write_u16(leaf.len() as u16).unwrap();
        for (block, &(offset, size)) in leaf.iter().zip(locs) {
            let bounds = block.item_bounds();
            out.write_u32(bounds.0).unwrap();
            out.write_u32(bounds.1).unwrap();
            out.write_u32(bounds.2).unwrap();
            out.write_u32(bounds.3).unwrap();
            out.write_u64(offset).unwrap();
            out.write_u64(size).unwrap();
        }
    }
    out.into_inner()
}

fn write_summary(out: &mut ByteOrdered<Vec<u8>, Endianness>, spec: &FileSpec) {
    let mut bases_covered = 0u64;
    let mut min_val = f64::INFINITY;
    let mut max_val = f64::NEG_INFINITY;
    let mut sum = 0.0f64;
    let mut sum_squares = 0.0f64;
    for &(start, end, value) in spec.leaves.iter().flatten().flat_map(|b| &b.records) {
        let len = f64::from(end - start);
        bases_covered += u64::from(end - start);
        min_val = min_val.min(f64::from(value));
        max_val = max_val.max(f64::from(value));
        sum += f64::from(value) * len;
        sum_squares += f64::from(value) * f64::from(value) * len;
    }
    if bases_covered == 0 {
        min_val = 0.0;
        max_val = 0.0;
    }
    out.write_u64(bases_covered).unwrap();
    out.write_f64(min_val).unwrap();
    out.write_f64(max_val).unwrap();
    out.write_f64(sum).unwrap();
    out.write_f64(sum_squares).unwrap();
}
