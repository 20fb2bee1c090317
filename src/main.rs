use clap::{Parser, Subcommand};
use std::path::PathBuf;

use umbf::blocks::{sign, Block, Node};
use umbf::File;

#[derive(Parser)]
#[command(name = "umbf")]
#[command(about = "Inspect UMBF container files", long_about = None)]
struct Cli {
    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Print the envelope header, block listing and checksum of a file
    Info { input: PathBuf },
    /// Print the file tree of a library file
    Tree { input: PathBuf },
    /// Recompute the checksum and compare it against an expected value
    Verify {
        input: PathBuf,
        /// Expected checksum as hex (e.g. 1c291ca3)
        #[arg(short, long)]
        expected: Option<String>,
    },
}

fn type_name(type_sign: u16) -> &'static str {
    match type_sign {
        sign::format::IMAGE => "image",
        sign::format::SCENE => "scene",
        sign::format::MATERIAL => "material",
        sign::format::TARGET => "target",
        sign::format::LIBRARY => "library",
        sign::format::RAW => "raw",
        sign::format::NONE => "none",
        _ => "unknown",
    }
}

fn block_summary(block: &Block) -> String {
    match block {
        Block::Image2d(image) => format!(
            "image2d {}x{}, {} channel(s), {} byte(s)/channel",
            image.width, image.height, image.channel_count, image.bytes_per_channel
        ),
        Block::Atlas(atlas) => format!(
            "atlas, {} rect(s), padding {}",
            atlas.pack_data.len(),
            atlas.padding
        ),
        Block::Material(material) => {
            format!("material, {} texture(s)", material.textures.len())
        }
        Block::Scene(scene) => format!(
            "scene, {} object(s), {} texture(s), {} material(s)",
            scene.objects.len(),
            scene.textures.len(),
            scene.materials.len()
        ),
        Block::Mesh(mesh) => format!(
            "mesh, {} vertices, {} face(s), {} indices",
            mesh.model.vertices.len(),
            mesh.model.faces.len(),
            mesh.model.indices.len()
        ),
        Block::MaterialInfo(info) => {
            format!("material info '{}', {} assignment(s)", info.name, info.assignments.len())
        }
        Block::MatRangeAssign(assign) => format!(
            "material range assignment #{}, {} face(s)",
            assign.mat_id,
            assign.faces.len()
        ),
        Block::Target(target) => format!("target -> {}", target.url),
        Block::Library(library) => format!("library '{}'", library.root.name),
    }
}

fn print_tree(node: &Node, depth: usize) {
    let indent = "  ".repeat(depth);
    if node.children.is_empty() && !node.is_folder {
        let type_sign = node.asset.as_ref().map_or(sign::format::NONE, |a| a.header.type_sign);
        println!("{indent}{} ({})", node.name, type_name(type_sign));
    } else {
        println!("{indent}{}/", node.name);
        for child in &node.children {
            print_tree(child, depth + 1);
        }
    }
}

fn main() -> Result<(), Box<dyn std::error::Error>> {
    env_logger::init();
    let cli = Cli::parse();
    match &cli.command {
        Commands::Info { input } => {
            let file = File::read_from_disk(input)?;
            println!("--- UMBF file: {} ---", input.display());
            println!("Type:           {}", type_name(file.header.type_sign));
            println!("Vendor:         {:#08x}", file.header.vendor_sign);
            println!("Vendor version: {:#08x}", file.header.vendor_version);
            println!("Spec version:   {:#08x}", file.header.spec_version);
            println!("Compressed:     {}", file.header.compressed);
            println!("Checksum:       {:08x}", file.checksum);
            println!("Blocks:         {}", file.blocks.len());
            for block in &file.blocks {
                println!("  {:#010x}  {}", block.signature(), block_summary(block));
            }
        }
        Commands::Tree { input } => {
            let file = File::read_from_disk(input)?;
            let Some(Block::Library(library)) = file.blocks.first() else {
                return Err(format!("{} is not a library file", input.display()).into());
            };
            print_tree(&library.root, 0);
        }
        Commands::Verify { input, expected } => {
            let file = File::read_from_disk(input)?;
            println!("Checksum: {:08x}", file.checksum);
            if let Some(expected) = expected {
                let expected = u32::from_str_radix(expected.trim_start_matches("0x"), 16)?;
                if file.checksum == expected {
                    println!("OK");
                } else {
                    return Err(format!(
                        "checksum mismatch: expected {expected:08x}, found {:08x}",
                        file.checksum
                    )
                    .into());
                }
            }
        }
    }
    Ok(())
}
