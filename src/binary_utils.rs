//! Little-endian helpers for the .bin artifact formats. The emitter appends
//! through the writers; the readers exist for consumers that load the
//! artifacts back (and for the round-trip tests).

use std::io::{self, Cursor, Read};

fn ensure_remaining(cursor: &Cursor<&[u8]>, needed: usize) -> io::Result<()> {
    let len = cursor.get_ref().len() as u64;
    let remaining = len.saturating_sub(cursor.position());
    if remaining < needed as u64 {
        return Err(io::Error::new(
            io::ErrorKind::UnexpectedEof,
            format!("need {} more byte(s), have {}", needed, remaining),
        ));
    }
    Ok(())
}

pub fn read_u8(cursor: &mut Cursor<&[u8]>) -> io::Result<u8> {
    ensure_remaining(cursor, 1)?;
    let mut buf = [0u8; 1];
    cursor.read_exact(&mut buf)?;
    Ok(buf[0])
}

pub fn read_u16_le(cursor: &mut Cursor<&[u8]>) -> io::Result<u16> {
    ensure_remaining(cursor, 2)?;
    let mut buf = [0u8; 2];
    cursor.read_exact(&mut buf)?;
    Ok(u16::from_le_bytes(buf))
}

pub fn read_u32_le(cursor: &mut Cursor<&[u8]>) -> io::Result<u32> {
    ensure_remaining(cursor, 4)?;
    let mut buf = [0u8; 4];
    cursor.read_exact(&mut buf)?;
    Ok(u32::from_le_bytes(buf))
}

pub fn read_bytes(cursor: &mut Cursor<&[u8]>, length: usize) -> io::Result<Vec<u8>> {
    ensure_remaining(cursor, length)?;
    let mut buf = vec![0u8; length];
    cursor.read_exact(&mut buf)?;
    Ok(buf)
}

pub fn write_u16_le(out: &mut Vec<u8>, value: u16) {
    out.extend_from_slice(&value.to_le_bytes());
}

pub fn write_u32_le(out: &mut Vec<u8>, value: u32) {
    out.extend_from_slice(&value.to_le_bytes());
}
