//! # RESP2 Encoding and Parsing
//!
//! Purpose: Encode client commands and parse server replies from a byte
//! buffer, keeping allocations under control.
//!
//! ## Design Principles
//! 1. **Incremental Parsing**: `parse_reply` reports "need more bytes" instead
//!    of blocking, so the connection can keep reading into the same buffer.
//! 2. **Buffer Reuse**: Caller provides buffers to avoid per-call allocations.
//! 3. **Binary-Safe**: Bulk strings are treated as raw bytes.
//! 4. **Fail Fast**: Invalid framing returns protocol errors immediately.

use rkit_common::{Arg, KitError, KitResult, Reply};

/// Encodes a RESP2 array command (`command` followed by `args`) into `out`.
pub fn encode_command(command: &[u8], args: &[Arg], out: &mut Vec<u8>) {
    out.push(b'*');
    push_usize(out, args.len() + 1);
    out.extend_from_slice(b"\r\n");
    push_bulk(out, command);
    for arg in args {
        push_bulk(out, arg.as_bytes());
    }
}

/// Parses one RESP value from the front of `buf`.
///
/// Returns `Ok(None)` when `buf` holds only part of a value, otherwise the
/// value together with the number of bytes it occupied.
pub fn parse_reply(buf: &[u8]) -> KitResult<Option<(Reply, usize)>> {
    parse_at(buf, 0)
}

fn parse_at(buf: &[u8], start: usize) -> KitResult<Option<(Reply, usize)>> {
    let (line, next) = match read_line(buf, start)? {
        Some(found) => found,
        None => return Ok(None),
    };
    if line.is_empty() {
        return Err(KitError::Protocol);
    }

    match line[0] {
        b'+' => Ok(Some((Reply::Simple(line[1..].to_vec()), next))),
        b'-' => Ok(Some((Reply::Error(line[1..].to_vec()), next))),
        b':' => Ok(Some((Reply::Integer(parse_i64(&line[1..])?), next))),
        b'$' => {
            let len = parse_i64(&line[1..])?;
            parse_bulk_len(buf, next, len)
        }
        b'*' => {
            let len = parse_i64(&line[1..])?;
            parse_array_len(buf, next, len)
        }
        _ => Err(KitError::Protocol),
    }
}

fn parse_bulk_len(buf: &[u8], start: usize, len: i64) -> KitResult<Option<(Reply, usize)>> {
    if len < 0 {
        return Ok(Some((Reply::Bulk(None), start)));
    }
    let end = start + len as usize;
    if buf.len() < end + 2 {
        return Ok(None);
    }
    if &buf[end..end + 2] != b"\r\n" {
        return Err(KitError::Protocol);
    }
    Ok(Some((Reply::Bulk(Some(buf[start..end].to_vec())), end + 2)))
}

fn parse_array_len(buf: &[u8], start: usize, len: i64) -> KitResult<Option<(Reply, usize)>> {
    if len < 0 {
        return Ok(Some((Reply::Nil, start)));
    }

    let mut items = Vec::with_capacity(len.min(1024) as usize);
    let mut pos = start;
    for _ in 0..len {
        match parse_at(buf, pos)? {
            Some((item, next)) => {
                items.push(item);
                pos = next;
            }
            None => return Ok(None),
        }
    }
    Ok(Some((Reply::Array(items), pos)))
}

fn read_line(buf: &[u8], start: usize) -> KitResult<Option<(&[u8], usize)>> {
    let newline = match buf[start..].iter().position(|&b| b == b'\n') {
        Some(offset) => start + offset,
        None => return Ok(None),
    };
    if newline == start || buf[newline - 1] != b'\r' {
        return Err(KitError::Protocol);
    }
    Ok(Some((&buf[start..newline - 1], newline + 1)))
}

fn parse_i64(data: &[u8]) -> KitResult<i64> {
    let (negative, digits) = match data.first() {
        Some(b'-') => (true, &data[1..]),
        _ => (false, data),
    };
    if digits.is_empty() {
        return Err(KitError::Protocol);
    }

    let mut value: i64 = 0;
    for &b in digits {
        if !b.is_ascii_digit() {
            return Err(KitError::Protocol);
        }
        value = value.saturating_mul(10).saturating_add((b - b'0') as i64);
    }

    if negative {
        Ok(-value)
    } else {
        Ok(value)
    }
}

fn push_bulk(out: &mut Vec<u8>, data: &[u8]) {
    out.push(b'$');
    push_usize(out, data.len());
    out.extend_from_slice(b"\r\n");
    out.extend_from_slice(data);
    out.extend_from_slice(b"\r\n");
}

fn push_usize(out: &mut Vec<u8>, mut value: usize) {
    // Write digits into a small stack buffer to avoid heap allocations.
    let mut buf = [0u8; 20];
    let mut len = 0;
    if value == 0 {
        buf[0] = b'0';
        len = 1;
    } else {
        while value > 0 {
            buf[len] = b'0' + (value % 10) as u8;
            value /= 10;
            len += 1;
        }
    }
    for idx in (0..len).rev() {
        out.push(buf[idx]);
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn parse_all(input: &[u8]) -> Reply {
        let (reply, used) = parse_reply(input).unwrap().expect("complete reply");
        assert_eq!(used, input.len());
        reply
    }

    #[test]
    fn encodes_command() {
        let mut buf = Vec::new();
        encode_command(b"SORT", &[Arg::from("letters"), Arg::from(3i64)], &mut buf);
        assert_eq!(&buf, b"*3\r\n$4\r\nSORT\r\n$7\r\nletters\r\n$1\r\n3\r\n");
    }

    #[test]
    fn parses_simple_string() {
        assert_eq!(parse_all(b"+OK\r\n"), Reply::Simple(b"OK".to_vec()));
    }

    #[test]
    fn parses_bulk_string() {
        assert_eq!(
            parse_all(b"$5\r\nhello\r\n"),
            Reply::Bulk(Some(b"hello".to_vec()))
        );
    }

    #[test]
    fn parses_null_bulk_string() {
        assert_eq!(parse_all(b"$-1\r\n"), Reply::Bulk(None));
    }

    #[test]
    fn parses_integer() {
        assert_eq!(parse_all(b":42\r\n"), Reply::Integer(42));
        assert_eq!(parse_all(b":-2\r\n"), Reply::Integer(-2));
    }

    #[test]
    fn parses_error() {
        assert_eq!(parse_all(b"-ERR bad\r\n"), Reply::Error(b"ERR bad".to_vec()));
    }

    #[test]
    fn parses_array_with_nil_members() {
        let reply = parse_all(b"*3\r\n$4\r\nloki\r\n$-1\r\n$3\r\n0.5\r\n");
        assert_eq!(
            reply,
            Reply::Array(vec![
                Reply::Bulk(Some(b"loki".to_vec())),
                Reply::Bulk(None),
                Reply::Bulk(Some(b"0.5".to_vec())),
            ])
        );
    }

    #[test]
    fn parses_null_and_empty_arrays() {
        assert_eq!(parse_all(b"*-1\r\n"), Reply::Nil);
        assert_eq!(parse_all(b"*0\r\n"), Reply::Array(Vec::new()));
    }

    #[test]
    fn incomplete_input_needs_more_bytes() {
        assert_eq!(parse_reply(b"").unwrap(), None);
        assert_eq!(parse_reply(b"$5\r\nhel").unwrap(), None);
        assert_eq!(parse_reply(b"*2\r\n$1\r\na\r\n").unwrap(), None);
    }

    #[test]
    fn reports_consumed_length_for_pipelined_input() {
        let (reply, used) = parse_reply(b":1\r\n:2\r\n").unwrap().unwrap();
        assert_eq!(reply, Reply::Integer(1));
        assert_eq!(used, 4);
    }

    #[test]
    fn rejects_bad_framing() {
        assert!(matches!(parse_reply(b"?x\r\n"), Err(KitError::Protocol)));
        assert!(matches!(parse_reply(b":12\n"), Err(KitError::Protocol)));
        assert!(matches!(parse_reply(b":1a\r\n"), Err(KitError::Protocol)));
        assert!(matches!(parse_reply(b"$2\r\nabXX"), Err(KitError::Protocol)));
        assert!(matches!(parse_reply(b":-\r\n"), Err(KitError::Protocol)));
    }
}
