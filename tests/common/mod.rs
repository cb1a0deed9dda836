//! Shared fixtures for integration tests

#![allow(dead_code)]

use byteorder::{ByteOrder, NativeEndian};

pub const VENDOR: &str = "xcbview test server";
pub const ROOT_WINDOW: u32 = 0x0000_0539;
pub const ROOT_VISUAL: u32 = 0x21;

pub fn init_logger() {
    let _ = env_logger::builder().is_test(true).try_init();
}

fn write_u16(buf: &mut Vec<u8>, val: u16) {
    let mut bytes = [0u8; 2];
    NativeEndian::write_u16(&mut bytes, val);
    buf.extend_from_slice(&bytes);
}

fn write_u32(buf: &mut Vec<u8>, val: u32) {
    let mut bytes = [0u8; 4];
    NativeEndian::write_u32(&mut bytes, val);
    buf.extend_from_slice(&bytes);
}

/// A successful setup reply: two pixmap formats and one 1920x1080 screen with
/// a 24-bit depth (one TrueColor visual) and an empty 1-bit depth.
pub fn setup_reply() -> Vec<u8> {
    let mut buffer = Vec::new();

    buffer.push(1); // Success
    buffer.push(0);
    write_u16(&mut buffer, 11);
    write_u16(&mut buffer, 0);
    write_u16(&mut buffer, 0); // Length, filled in below
    write_u32(&mut buffer, 12_101_004);
    write_u32(&mut buffer, 0x0020_0000);
    write_u32(&mut buffer, 0x001f_ffff);
    write_u32(&mut buffer, 256);
    write_u16(&mut buffer, VENDOR.len() as u16);
    write_u16(&mut buffer, 65535);
    buffer.push(1); // Screens
    buffer.push(2); // Pixmap formats
    buffer.extend_from_slice(&[0, 0, 32, 32, 8, 255]);
    buffer.extend_from_slice(&[0u8; 4]);

    buffer.extend_from_slice(VENDOR.as_bytes());
    buffer.resize(buffer.len() + (4 - VENDOR.len() % 4) % 4, 0);

    for (depth, bpp) in [(1u8, 1u8), (24, 32)] {
        buffer.extend_from_slice(&[depth, bpp, 32, 0, 0, 0, 0, 0]);
    }

    // Screen
    write_u32(&mut buffer, ROOT_WINDOW);
    write_u32(&mut buffer, 0x20); // Default colormap
    write_u32(&mut buffer, 0xffffff);
    write_u32(&mut buffer, 0x000000);
    write_u32(&mut buffer, 0);
    write_u16(&mut buffer, 1920);
    write_u16(&mut buffer, 1080);
    write_u16(&mut buffer, 508);
    write_u16(&mut buffer, 285);
    write_u16(&mut buffer, 1);
    write_u16(&mut buffer, 1);
    write_u32(&mut buffer, ROOT_VISUAL);
    buffer.extend_from_slice(&[0, 0, 24, 2]);

    // 24-bit depth with one visual
    buffer.extend_from_slice(&[24, 0]);
    write_u16(&mut buffer, 1);
    buffer.extend_from_slice(&[0u8; 4]);
    write_u32(&mut buffer, ROOT_VISUAL);
    buffer.extend_from_slice(&[4, 8]); // TrueColor, 8 bits per RGB
    write_u16(&mut buffer, 256);
    write_u32(&mut buffer, 0xff0000);
    write_u32(&mut buffer, 0x00ff00);
    write_u32(&mut buffer, 0x0000ff);
    buffer.extend_from_slice(&[0u8; 4]);

    // 1-bit depth, no visuals
    buffer.extend_from_slice(&[1, 0, 0, 0, 0, 0, 0, 0]);

    let length = ((buffer.len() - 8) / 4) as u16;
    NativeEndian::write_u16(&mut buffer[6..8], length);

    buffer
}

/// A 32-byte event packet
pub fn event_packet(response_type: u8) -> Vec<u8> {
    let mut packet = vec![0u8; 32];
    packet[0] = response_type;
    packet
}

/// A 32-byte error packet
pub fn error_packet(code: u8, sequence: u16) -> Vec<u8> {
    let mut packet = vec![0u8; 32];
    packet[1] = code;
    NativeEndian::write_u16(&mut packet[2..4], sequence);
    packet
}
