//! Nested messages example.
//!
//! Builds a spawn-style message holding several child messages, then walks
//! it back with scoped readers.
//!
//! Run with: `cargo run --example nested`

use tagwire::{MessageReader, MessageWriter, Result};

const TAG_SPAWN: u8 = 4;
const TAG_CHILD: u8 = 1;

fn build() -> Result<bytes::Bytes> {
    let mut writer = MessageWriter::new(256);
    writer.start_message(TAG_SPAWN)?;
    writer.write_packed_u32(3); // spawn id
    writer.write_packed_i32(-2); // owner
    writer.write_packed_i32(2); // child count

    for (child_id, name) in [(10u32, "left"), (11, "right")] {
        writer.write_packed_u32(child_id);
        writer.start_message(TAG_CHILD)?;
        writer.write_str(name)?;
        writer.write_u8(4);
        writer.end_message()?;
    }

    writer.end_message()?;
    writer.finish()
}

fn main() -> Result<()> {
    let bytes = build()?;
    println!("Encoded {} bytes: {:?}", bytes.len(), &bytes[..]);

    let mut spawn = MessageReader::get(&bytes, 0)?;
    let spawn_id = spawn.read_packed_u32()?;
    let owner = spawn.read_packed_i32()?;
    let children = spawn.read_packed_i32()?;
    println!("Spawn {spawn_id} for owner {owner} with {children} children");

    for _ in 0..children {
        let child_id = spawn.read_packed_u32()?;
        let mut child = spawn.read_message()?;
        let name = child.read_str()?;
        let players = child.read_u8()?;
        println!(
            "  child {child_id} (tag {:?}, {} bytes): {name}, {players} players",
            child.tag(),
            child.len()
        );
    }

    Ok(())
}
