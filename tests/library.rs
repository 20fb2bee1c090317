//! Library files on disk: round trips, corruption handling, and the
//! directory-scanning registry.

use umbf::blocks::{Block, Image2d, Library, Node, PixelFormat};
use umbf::{sign, BinStream, File, Header, Registry};

fn image_file() -> File {
    let mut file = File::new(Header {
        vendor_sign: umbf::UMBF_VENDOR_ID,
        type_sign: sign::format::IMAGE,
        ..Header::default()
    });
    file.blocks.push(Block::Image2d(Image2d {
        width: 1,
        height: 1,
        channel_count: 1,
        channel_names: vec!["L".into()],
        bytes_per_channel: 1,
        format: PixelFormat::UINT,
        pixels: vec![128],
    }));
    file
}

fn two_leaf_library(root_name: &str) -> File {
    let mut root = Node::folder(root_name);
    root.children.push(Node::leaf("noise", image_file()));
    let mut sub = Node::folder("materials");
    sub.children.push(Node::leaf("ball", image_file()));
    root.children.push(sub);

    let mut file = File::new(Header {
        vendor_sign: umbf::UMBF_VENDOR_ID,
        type_sign: sign::format::LIBRARY,
        ..Header::default()
    });
    file.blocks.push(Block::Library(Library { root }));
    file
}

#[test]
fn s6_valid_library_roundtrips_losslessly() {
    let dir = tempfile::tempdir().unwrap();
    let path = dir.path().join("core.umlib");

    let mut file = two_leaf_library("core");
    file.save(&path, 0).unwrap();

    let out = File::read_from_disk(&path).unwrap();
    assert_eq!(out, file);
    let Some(Block::Library(library)) = out.blocks.first() else {
        panic!("expected a library block");
    };
    assert_eq!(library.get_node("noise").unwrap().name, "noise");
    let ball = library.get_node("materials/ball").unwrap();
    assert_eq!(
        ball.asset.as_ref().unwrap().header.type_sign,
        sign::format::IMAGE
    );
}

#[test]
fn s6_untyped_leaf_fails_the_whole_file() {
    // The strict writer refuses to produce this, so assemble the bytes by
    // hand: a library whose second leaf embeds a type-less file.
    let mut payload = BinStream::new();
    payload.write_str("broken").write_u8(0).write_u16(2);
    payload.write_str("good").write_u8(0).write_u16(0);
    payload.write_bytes(&Header { type_sign: sign::format::IMAGE, ..Header::default() }.pack());
    payload.write_u64(0); // nested file with no blocks
    payload.write_str("bad").write_u8(0).write_u16(0);
    payload.write_bytes(&Header::default().pack()); // type_sign == none
    payload.write_u64(0);

    let mut bytes = BinStream::new();
    bytes.write_u32(umbf::UMBF_MAGIC);
    bytes.write_bytes(&Header { type_sign: sign::format::LIBRARY, ..Header::default() }.pack());
    bytes.write_u64(payload.len() as u64);
    bytes.write_u32(0x8D7824FA);
    bytes.write_bytes(payload.data());
    bytes.write_u64(0);

    let dir = tempfile::tempdir().unwrap();
    let path = dir.path().join("broken.umlib");
    std::fs::write(&path, bytes.data()).unwrap();

    assert!(matches!(
        File::read_from_disk(&path),
        Err(umbf::Error::CorruptLibrary(_))
    ));
}

#[test]
fn registry_scans_a_directory_recursively() {
    let dir = tempfile::tempdir().unwrap();
    std::fs::create_dir(dir.path().join("nested")).unwrap();

    two_leaf_library("core")
        .save(dir.path().join("core.umlib"), 0)
        .unwrap();
    two_leaf_library("extras")
        .save(dir.path().join("nested/extras.umlib"), 0)
        .unwrap();
    // Non-library payloads and foreign extensions are ignored.
    image_file().save(dir.path().join("decoy.umlib"), 0).unwrap();
    image_file().save(dir.path().join("texture.umbf"), 0).unwrap();
    std::fs::write(dir.path().join("junk.umlib"), b"not a container").unwrap();

    let mut registry = Registry::new();
    registry.init(dir.path()).unwrap();

    assert_eq!(registry.len(), 2);
    let core = registry.get("core").unwrap();
    assert_eq!(core.get_node("materials/ball").unwrap().name, "ball");
    assert!(registry.get("extras").is_some());
    assert!(registry.get("decoy").is_none());
}

#[test]
fn registry_init_fails_on_a_missing_directory() {
    let mut registry = Registry::new();
    assert!(matches!(
        registry.init("/definitely/not/here"),
        Err(umbf::Error::AssetsNotFound(_))
    ));
    assert!(registry.is_empty());
}
