use std::io::Write;
use std::ops::ControlFlow;
use std::path::{Path, PathBuf};

use flate2::write::GzEncoder;
use flate2::Compression;
use tempfile::TempDir;

use molpack::binary_cif::{parse_binary, ValueKind};
use molpack::cif;
use molpack::convert::{convert, read_document, ConvertError, ConvertOptions, Progress};

const MMCIF: &str = "data_1crn
#
_entry.id 1CRN
#
_cell.length_a 40.960
_cell.length_b 18.650
_cell.length_c 22.520
#
loop_
_atom_site.group_PDB
_atom_site.id
_atom_site.type_symbol
_atom_site.label_atom_id
_atom_site.label_alt_id
_atom_site.label_comp_id
_atom_site.label_asym_id
_atom_site.label_seq_id
_atom_site.Cartn_x
_atom_site.Cartn_y
_atom_site.Cartn_z
_atom_site.occupancy
_atom_site.B_iso_or_equiv
ATOM 1 N N   . THR A 1 17.047 14.099 3.625 1.00 13.79
ATOM 2 C CA  . THR A 1 16.967 12.784 4.338 1.00 10.80
ATOM 3 C C   . THR A 1 15.685 12.755 5.133 1.00 9.19
ATOM 4 O O   . THR A 1 15.268 13.825 5.594 1.00 9.85
ATOM 5 C CB  A THR A 1 18.170 12.703 5.337 0.50 13.02
ATOM 6 C CB  B THR A 1 18.150 12.690 5.330 0.50 13.02
#
";

fn write_file(dir: &TempDir, name: &str, bytes: &[u8]) -> PathBuf {
    let path = dir.path().join(name);
    std::fs::write(&path, bytes).unwrap();
    path
}

fn gzip(bytes: &[u8]) -> Vec<u8> {
    let mut gz = GzEncoder::new(Vec::new(), Compression::default());
    gz.write_all(bytes).unwrap();
    gz.finish().unwrap()
}

fn run(path: &Path, options: &ConvertOptions) -> Vec<u8> {
    convert(path, options, &mut |_: &Progress| ControlFlow::Continue(())).unwrap()
}

#[test]
fn cif_to_bcif_keeps_values() {
    let dir = TempDir::new().unwrap();
    let src = write_file(&dir, "1crn.cif", MMCIF.as_bytes());
    let out = run(&src, &ConvertOptions::default());

    let file = parse_binary(&out).unwrap();
    assert_eq!(file.data_blocks.len(), 1);
    let block = &file.data_blocks[0];
    assert_eq!(block.header, "1CRN");
    let names: Vec<&str> = block.categories.iter().map(|c| c.name.as_str()).collect();
    assert_eq!(names, vec!["_entry", "_cell", "_atom_site"]);

    let atoms = block.category("_atom_site").unwrap();
    assert_eq!(atoms.row_count, 6);
    let ids = atoms.column("id").unwrap().decode().unwrap();
    assert_eq!(ids.to_i32_vec().unwrap(), vec![1, 2, 3, 4, 5, 6]);

    let x = atoms.column("Cartn_x").unwrap().decode().unwrap();
    let x = x.to_f64_vec().unwrap();
    let expected = [17.047, 16.967, 15.685, 15.268, 18.170, 18.150];
    for (got, want) in x.iter().zip(expected) {
        assert!((got - want).abs() < 1e-6);
    }

    let alt = atoms.column("label_alt_id").unwrap();
    let mask = alt.decode_mask().unwrap().unwrap();
    assert_eq!(mask[0], ValueKind::NotPresent);
    assert_eq!(mask[4], ValueKind::Present);
}

#[test]
fn gzipped_cif_input() {
    let dir = TempDir::new().unwrap();
    let src = write_file(&dir, "1crn.cif.gz", &gzip(MMCIF.as_bytes()));
    let doc = read_document(&src).unwrap();
    assert_eq!(doc.blocks[0].category("atom_site").unwrap().row_count, 6);

    let out = run(&src, &ConvertOptions::default());
    let file = parse_binary(&out).unwrap();
    assert!(file.data_blocks[0].category("_cell").is_some());
}

#[test]
fn bcif_input_converts_back_to_text() {
    let dir = TempDir::new().unwrap();
    let src = write_file(&dir, "1crn.cif", MMCIF.as_bytes());
    let bcif = run(&src, &ConvertOptions::default());
    let bcif_path = write_file(&dir, "1crn.bcif.gz", &gzip(&bcif));

    let text = run(
        &bcif_path,
        &ConvertOptions {
            as_text: true,
            ..Default::default()
        },
    );
    let text = String::from_utf8(text).unwrap();
    assert!(text.starts_with("data_1CRN"));

    let doc = cif::parse(&text).unwrap();
    let block = &doc.blocks[0];
    assert_eq!(block.field("entry.id").unwrap().str(0), "1CRN");
    assert_eq!(block.field("cell.length_a").unwrap().float(0), 40.96);
    let atoms = block.category("atom_site").unwrap();
    assert_eq!(atoms.field("label_atom_id").unwrap().str(1), "CA");
    assert_eq!(atoms.field("label_alt_id").unwrap().value_kind(0), ValueKind::NotPresent);
    assert_eq!(atoms.field("label_alt_id").unwrap().str(5), "B");
    assert_eq!(atoms.field("occupancy").unwrap().float(4), 0.5);
}

#[test]
fn filter_restricts_output() {
    let dir = TempDir::new().unwrap();
    let src = write_file(&dir, "1crn.cif", MMCIF.as_bytes());
    let options = ConvertOptions {
        filter: Some("atom_site.id\natom_site.Cartn_x\ncell\n!cell.length_c\n".into()),
        ..Default::default()
    };
    let file = parse_binary(&run(&src, &options)).unwrap();
    let block = &file.data_blocks[0];
    assert!(block.category("_entry").is_none());

    let cell = block.category("_cell").unwrap();
    let cell_columns: Vec<&str> = cell.columns.iter().map(|c| c.name.as_str()).collect();
    assert_eq!(cell_columns, vec!["length_a", "length_b"]);

    let atoms = block.category("_atom_site").unwrap();
    let atom_columns: Vec<&str> = atoms.columns.iter().map(|c| c.name.as_str()).collect();
    assert_eq!(atom_columns, vec!["id", "Cartn_x"]);
}

#[test]
fn progress_reaches_max() {
    let dir = TempDir::new().unwrap();
    let src = write_file(&dir, "1crn.cif", MMCIF.as_bytes());
    let mut last = None;
    convert(&src, &ConvertOptions::default(), &mut |p: &Progress| {
        last = Some((p.current, p.max));
        ControlFlow::Continue(())
    })
    .unwrap();
    // 3 categories, 1 + 3 + 13 fields
    assert_eq!(last, Some((20, 20)));
}

#[test]
fn missing_file_is_io_error() {
    let dir = TempDir::new().unwrap();
    let err = convert(
        &dir.path().join("absent.cif"),
        &ConvertOptions::default(),
        &mut |_: &Progress| ControlFlow::Continue(()),
    )
    .unwrap_err();
    assert!(matches!(err, ConvertError::Io(_)));
}

#[test]
fn malformed_cif_is_parse_error() {
    let dir = TempDir::new().unwrap();
    let src = write_file(&dir, "bad.cif", b"data_x\n_entry.id 'unterminated\n");
    let err = convert(&src, &ConvertOptions::default(), &mut |_: &Progress| {
        ControlFlow::Continue(())
    })
    .unwrap_err();
    assert!(matches!(err, ConvertError::Parse(_)));
}
