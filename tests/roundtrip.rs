//! End-to-end container round trips over the public API.

use glam::{Vec2, Vec3};

use umbf::blocks::mesh::bary;
use umbf::blocks::{
    Aabb, Atlas, Image2d, IndexedFace, MatRangeAssign, Material, MaterialInfo, MaterialNode,
    MeshBlock, Model, Object, PackRect, PixelFormat, Scene, Target, Vertex, VertexRef,
};
use umbf::{crc32, sign, Block, File, Header};

fn scene_header() -> Header {
    Header {
        vendor_sign: umbf::UMBF_VENDOR_ID,
        vendor_version: 0x010200,
        type_sign: sign::format::SCENE,
        spec_version: 0x000003,
        compressed: false,
    }
}

fn minimal_scene() -> File {
    let mut file = File::new(scene_header());
    file.blocks.push(Block::Scene(Scene {
        objects: vec![Object { id: 42, name: "root".into(), meta: vec![] }],
        textures: vec![],
        materials: vec![],
    }));
    file
}

#[test]
fn s1_minimal_scene_roundtrip() {
    let mut file = minimal_scene();
    let bytes = file.to_bytes(0).unwrap();
    let out = File::read_from_bytes(&bytes).unwrap();

    assert_eq!(out.blocks.len(), 1);
    assert_eq!(out.blocks[0].signature(), 0xB7A3EE80);
    let Block::Scene(scene) = &out.blocks[0] else {
        panic!("expected a scene block");
    };
    assert_eq!(scene.objects.len(), 1);
    assert_eq!(scene.objects[0].id, 42);
    assert_eq!(scene.objects[0].name, "root");

    let body = &bytes[4 + Header::PACKED_SIZE..];
    assert_eq!(out.checksum, crc32(body));
    assert_ne!(out.checksum, 0);
    assert_eq!(out, file);
}

#[test]
fn s2_unknown_block_is_skipped() {
    let bytes = minimal_scene().to_bytes(0).unwrap();

    // Splice a synthetic frame right before the trailing u64(0) terminator.
    let terminator = bytes.len() - 8;
    let mut spliced = bytes[..terminator].to_vec();
    spliced.extend_from_slice(&7u64.to_le_bytes());
    spliced.extend_from_slice(&0xDEADBEEFu32.to_le_bytes());
    spliced.extend_from_slice(&[0, 1, 2, 3, 4, 5, 6]);
    spliced.extend_from_slice(&bytes[terminator..]);

    let out = File::read_from_bytes(&spliced).unwrap();
    assert_eq!(out.blocks.len(), 1);
    assert!(matches!(out.blocks[0], Block::Scene(_)));
}

#[test]
fn s3_textured_material_roundtrip() {
    let header = Header { type_sign: sign::format::MATERIAL, ..scene_header() };

    let mut textured = File::new(header);
    textured.blocks.push(Block::Material(Material {
        textures: vec![],
        albedo: MaterialNode {
            rgb: Vec3::new(0.1, 0.2, 0.3),
            textured: true,
            texture_id: 0x1234,
        },
    }));
    let out = File::read_from_bytes(&textured.to_bytes(0).unwrap()).unwrap();
    assert_eq!(out, textured);

    let mut untextured = File::new(header);
    untextured.blocks.push(Block::Material(Material {
        textures: vec![],
        albedo: MaterialNode {
            rgb: Vec3::new(0.1, 0.2, 0.3),
            textured: false,
            texture_id: 0x1234,
        },
    }));
    let out = File::read_from_bytes(&untextured.to_bytes(0).unwrap()).unwrap();
    let Block::Material(material) = &out.blocks[0] else {
        panic!("expected a material block");
    };
    assert!(!material.albedo.textured);
    assert_eq!(material.albedo.texture_id, 0);
}

#[test]
fn s4_atlas_and_image_stay_in_order() {
    let mut file = File::new(Header { type_sign: sign::format::IMAGE, ..scene_header() });
    file.blocks.push(Block::Image2d(Image2d {
        width: 256,
        height: 256,
        channel_count: 4,
        channel_names: vec!["R".into(), "G".into(), "B".into(), "A".into()],
        bytes_per_channel: 1,
        format: PixelFormat::UINT,
        pixels: vec![0u8; 256 * 256 * 4],
    }));
    file.blocks.push(Block::Atlas(Atlas {
        discard_step: 4,
        padding: 2,
        pack_data: vec![
            PackRect { w: 64, h: 64, x: 0, y: 0 },
            PackRect { w: 64, h: 64, x: 64, y: 0 },
        ],
    }));

    let out = File::read_from_bytes(&file.to_bytes(0).unwrap()).unwrap();
    assert_eq!(out, file);
    assert!(matches!(out.blocks[0], Block::Image2d(_)));
    let Block::Atlas(atlas) = &out.blocks[1] else {
        panic!("expected an atlas block");
    };
    assert_eq!(atlas.pack_data.len(), 2);
    assert_eq!(atlas.pack_data[1], PackRect { w: 64, h: 64, x: 64, y: 0 });
}

#[test]
fn s5_triangle_mesh_with_barycentrics() {
    let vertices = vec![
        Vertex { pos: Vec3::new(0.0, 0.0, 0.0), uv: Vec2::ZERO, normal: Vec3::Z },
        Vertex { pos: Vec3::new(1.0, 0.0, 0.0), uv: Vec2::X, normal: Vec3::Z },
        Vertex { pos: Vec3::new(0.0, 1.0, 0.0), uv: Vec2::Y, normal: Vec3::Z },
    ];
    let mut aabb = Aabb::default();
    for vertex in &vertices {
        aabb.encapsulate(vertex.pos);
    }
    let mut file = File::new(scene_header());
    file.blocks.push(Block::Mesh(MeshBlock {
        model: Model {
            vertices,
            group_count: 1,
            faces: vec![IndexedFace {
                vertices: vec![
                    VertexRef { group: 0, vertex: 0 },
                    VertexRef { group: 0, vertex: 1 },
                    VertexRef { group: 0, vertex: 2 },
                ],
                normal: Vec3::Z,
                first_index: 0,
                count: 3,
            }],
            indices: vec![0, 1, 2],
            aabb,
        },
        ..MeshBlock::default()
    }));

    let out = File::read_from_bytes(&file.to_bytes(0).unwrap()).unwrap();
    assert_eq!(out, file);
    let Block::Mesh(mesh) = &out.blocks[0] else {
        panic!("expected a mesh block");
    };
    assert_eq!(mesh.model.indices, vec![0, 1, 2]);
    assert_eq!(mesh.model.faces[0].first_index, 0);
    assert_eq!(mesh.model.faces[0].count, 3);

    // The wireframe side channel: three distinct corner patterns survive
    // the 3-bit word packing exactly.
    let words = bary::pack_patterns(&[0b100, 0b010, 0b001]);
    let components = bary::unpack_components(&words, 3);
    assert_eq!(components[0], Vec3::new(1.0, 0.0, 0.0));
    assert_eq!(components[1], Vec3::new(0.0, 1.0, 0.0));
    assert_eq!(components[2], Vec3::new(0.0, 0.0, 1.0));
}

#[test]
fn s7_bit_flip_changes_the_checksum() {
    let mut file = minimal_scene();
    let bytes = file.to_bytes(0).unwrap();
    let original = File::read_from_bytes(&bytes).unwrap();

    // Flip one bit inside the object name so the stream still decodes.
    let name_at = bytes
        .windows(4)
        .position(|w| w == b"root")
        .expect("object name must be in the block stream");
    let mut tampered = bytes.clone();
    tampered[name_at] ^= 0x10;

    let out = File::read_from_bytes(&tampered).unwrap();
    assert_eq!(out.blocks.len(), 1);
    assert_ne!(out.checksum, original.checksum);
}

#[test]
fn compressed_and_raw_envelopes_decode_to_equal_files() {
    let big_mesh = MeshBlock {
        model: Model {
            vertices: (0..500)
                .map(|i| Vertex {
                    pos: Vec3::splat(i as f32),
                    uv: Vec2::splat(i as f32 * 0.25),
                    normal: Vec3::Y,
                })
                .collect(),
            group_count: 0,
            faces: vec![],
            indices: vec![],
            aabb: Aabb { min: Vec3::ZERO, max: Vec3::splat(499.0) },
        },
        ..MeshBlock::default()
    };

    let mut raw = File::new(scene_header());
    raw.blocks.push(Block::Mesh(big_mesh));
    let mut compressed = raw.clone();
    compressed.header.compressed = true;

    let raw_bytes = raw.to_bytes(0).unwrap();
    let compressed_bytes = compressed.to_bytes(umbf::DEFAULT_COMPRESSION_LEVEL).unwrap();
    assert!(compressed_bytes.len() < raw_bytes.len());

    let raw_out = File::read_from_bytes(&raw_bytes).unwrap();
    let compressed_out = File::read_from_bytes(&compressed_bytes).unwrap();
    assert_eq!(raw_out.blocks, compressed_out.blocks);
    // The checksum covers the pre-compression stream, so it agrees too.
    assert_eq!(raw_out.checksum, compressed_out.checksum);
    assert_eq!(raw.checksum, compressed.checksum);
}

#[test]
fn nested_files_and_bookkeeping_blocks_roundtrip() {
    let texture_file = {
        let mut texture = File::new(Header { type_sign: sign::format::IMAGE, ..scene_header() });
        texture.blocks.push(Block::Image2d(Image2d {
            width: 2,
            height: 2,
            channel_count: 1,
            channel_names: vec!["L".into()],
            bytes_per_channel: 1,
            format: PixelFormat::UINT,
            pixels: vec![1, 2, 3, 4],
        }));
        texture
    };

    let mut file = File::new(scene_header());
    file.blocks.push(Block::Scene(Scene {
        objects: vec![Object {
            id: 7,
            name: "cube".into(),
            meta: vec![
                Block::Mesh(MeshBlock::default()),
                Block::MatRangeAssign(MatRangeAssign { mat_id: 3, faces: vec![0, 1] }),
            ],
        }],
        textures: vec![texture_file.clone()],
        materials: vec![{
            let mut material =
                File::new(Header { type_sign: sign::format::MATERIAL, ..scene_header() });
            material.blocks.push(Block::Material(Material {
                textures: vec![texture_file],
                albedo: MaterialNode { rgb: Vec3::ONE, textured: true, texture_id: 0 },
            }));
            material
        }],
    }));
    file.blocks.push(Block::MaterialInfo(MaterialInfo {
        id: 3,
        name: "plastic".into(),
        assignments: vec![7],
    }));
    file.blocks.push(Block::Target(Target {
        url: "shared/textures/noise.umbf".into(),
        header: Header { type_sign: sign::format::IMAGE, ..scene_header() },
        checksum: 0xA1B2C3D4,
    }));

    let out = File::read_from_bytes(&file.to_bytes(0).unwrap()).unwrap();
    assert_eq!(out, file);
}

#[test]
fn truncated_file_fails_to_decode() {
    let bytes = minimal_scene().to_bytes(0).unwrap();
    assert!(File::read_from_bytes(&bytes[..bytes.len() - 12]).is_err());
    assert!(File::read_from_bytes(&bytes[..10]).is_err());
}
