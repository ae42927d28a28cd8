use mediademux::rmff::objects::{
    parse_content_description, parse_file_properties, parse_media_properties, read_data_header,
    read_object_header, read_packet_header, ObjectHeader, OBJECT_HEADER_SIZE,
};
use mediademux::rmff::type_specific::{parse_type_specific, TypeSpecific};
use mediademux::rmff::{CONT_ID, DATA_ID, MDPR_ID, PROP_ID};
use mediademux::{identify_file, LocalSeekableStream, SeekableStream};
use std::env;
use std::io::{Read, Seek, SeekFrom};

/// Packets listed per DATA section before the rest is summarized
const MAX_LISTED_PACKETS: u32 = 50;

fn main() {
    println!("🔍 RealMedia Scanner - Object and Packet Structure");
    println!("==================================================");

    let args: Vec<String> = env::args().collect();
    if args.len() < 2 {
        println!("Usage: rmff_scanner <file.rm> [--all-packets]");
        println!("Example: rmff_scanner tests/testdata/sample.rm");
        return;
    }
    let file_path = &args[1];
    let all_packets = args.iter().any(|a| a == "--all-packets");

    match scan_rmff_structure(file_path, all_packets) {
        Ok(_) => println!("\n✅ Scan completed successfully"),
        Err(e) => println!("\n❌ Scan failed: {}", e),
    }

    match identify_file(file_path) {
        Ok(info) => {
            println!("\n🎞️  Tracks:");
            for t in &info.tracks {
                println!("  Track ID {}: {} [{}]", t.id, t.summary(), t.codec_id);
            }
        }
        Err(e) => println!("\n❌ Identification failed: {}", e),
    }
}

fn scan_rmff_structure(path: &str, all_packets: bool) -> Result<(), Box<dyn std::error::Error>> {
    let mut file = LocalSeekableStream::open(path)?;
    let file_size = file.source_len()?;

    println!("📄 File: {}", path);
    println!("📏 Size: {} bytes", file_size);
    println!();

    while file.tell()? + u64::from(OBJECT_HEADER_SIZE) <= file_size {
        let pos = file.tell()?;
        let header = read_object_header(&mut file)?;
        println!(
            "📦 {} [size: {}, version: {}, pos: {}]",
            header.name(),
            header.size,
            header.version,
            pos
        );

        if header.size < OBJECT_HEADER_SIZE || pos + u64::from(header.size) > file_size {
            println!("⚠️  Invalid object size: {} at position {}", header.size, pos);
            break;
        }

        if &header.id == DATA_ID {
            scan_data_section(&mut file, &header, pos, all_packets)?;
        } else {
            describe_object(&mut file, &header)?;
        }
        file.seek(SeekFrom::Start(pos + u64::from(header.size)))?;
    }

    Ok(())
}

fn describe_object(
    file: &mut LocalSeekableStream,
    header: &ObjectHeader,
) -> Result<(), Box<dyn std::error::Error>> {
    let size = header.payload_size().unwrap_or(0) as usize;
    let mut payload = vec![0u8; size];
    file.read_exact(&mut payload)?;

    match &header.id {
        id if id == PROP_ID => {
            let p = parse_file_properties(&payload)?;
            println!(
                "  🧾 {} packets, {} ms, {} streams, avg bit rate {}",
                p.num_packets, p.duration, p.num_streams, p.avg_bit_rate
            );
        }
        id if id == CONT_ID => {
            let c = parse_content_description(&payload)?;
            for (label, text) in [
                ("title", &c.title),
                ("author", &c.author),
                ("copyright", &c.copyright),
                ("comment", &c.comment),
            ] {
                if !text.is_empty() {
                    println!("  📝 {}: {:?}", label, text);
                }
            }
        }
        id if id == MDPR_ID => {
            let m = parse_media_properties(&payload)?;
            println!(
                "  🎚️  stream {} {:?} ({}), preroll {} ms",
                m.stream_id, m.stream_name, m.mime_type, m.preroll
            );
            match parse_type_specific(&m.type_specific) {
                TypeSpecific::Video(v) => println!(
                    "    🎥 {} {}x{} @ {:.3} fps",
                    String::from_utf8_lossy(&v.fourcc),
                    v.width,
                    v.height,
                    v.frame_rate
                ),
                TypeSpecific::Audio(a) => println!(
                    "    🔊 v{} {} {} Hz, {} channels, {} bits, {} extra bytes",
                    a.version,
                    a.fourcc
                        .map(|f| String::from_utf8_lossy(&f).into_owned())
                        .unwrap_or_else(|| "????".to_string()),
                    a.sample_rate,
                    a.channels,
                    a.sample_size,
                    a.extra_data.len()
                ),
                TypeSpecific::Other => println!(
                    "    📄 First bytes: {:02X?}",
                    &m.type_specific[..m.type_specific.len().min(16)]
                ),
            }
        }
        _ => {
            if !payload.is_empty() {
                println!(
                    "  🔍 First {} bytes: {:02X?}",
                    payload.len().min(32),
                    &payload[..payload.len().min(32)]
                );
            }
        }
    }
    Ok(())
}

fn scan_data_section(
    file: &mut LocalSeekableStream,
    header: &ObjectHeader,
    pos: u64,
    all_packets: bool,
) -> Result<(), Box<dyn std::error::Error>> {
    let data = read_data_header(file)?;
    println!(
        "  🗂️  {} packets, next DATA header at {}",
        data.num_packets, data.next_data_header
    );

    let end = pos + u64::from(header.size);
    let mut listed = 0;
    let mut keyframes = 0;
    for n in 0..data.num_packets {
        if file.tell()? + 12 > end {
            println!("  ⚠️  Section ends after {} packets", n);
            break;
        }
        let packet_pos = file.tell()?;
        let p = read_packet_header(file)?;
        let len = match p.payload_length() {
            Some(len) => len as u64,
            None => {
                println!("  ⚠️  Packet length {} too small at {}", p.length, packet_pos);
                break;
            }
        };
        if p.is_keyframe() {
            keyframes += 1;
        }
        if all_packets || listed < MAX_LISTED_PACKETS {
            println!(
                "  📦 stream {} ts {} ms len {}{} [pos: {}]",
                p.stream_id,
                p.timestamp_ms,
                len,
                if p.is_keyframe() { " key" } else { "" },
                packet_pos
            );
            listed += 1;
        }
        file.skip(len)?;
    }
    if listed < data.num_packets {
        println!("  … {} more packets", data.num_packets - listed);
    }
    println!("  🔑 {} keyframe packets", keyframes);
    Ok(())
}
