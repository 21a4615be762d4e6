use std::fs::File;
use std::io::{BufRead, BufReader, Write};
use std::path::Path;

use anyhow::{Context, Result};
use log::warn;

use crate::align::PrecomputedAlignment;
use crate::table::SequenceStore;

#[derive(Debug, Clone)]
pub struct FastaRecord {
    pub id: String,
    pub seq: Vec<u8>,
}

/// 流式 FASTA 读取：id 取 header 的第一个 token，序列行去除空白并转大写，
/// `-` 与 `.` 原样保留，因此同一个 reader 也能读取比对后的 FASTA。
pub struct FastaReader<R: BufRead> {
    reader: R,
    buf: String,
    done: bool,
    peek_header: Option<String>,
}

impl<R: BufRead> FastaReader<R> {
    pub fn new(reader: R) -> Self {
        Self {
            reader,
            buf: String::new(),
            done: false,
            peek_header: None,
        }
    }

    pub fn next_record(&mut self) -> Result<Option<FastaRecord>> {
        if self.done {
            return Ok(None);
        }

        let header = match self.peek_header.take() {
            Some(h) => h,
            None => loop {
                self.buf.clear();
                if self.reader.read_line(&mut self.buf)? == 0 {
                    self.done = true;
                    return Ok(None);
                }
                if let Some(h) = self.buf.strip_prefix('>') {
                    break h.trim().to_string();
                }
            },
        };
        let id = header.split_whitespace().next().unwrap_or("").to_string();

        let mut seq: Vec<u8> = Vec::new();
        loop {
            self.buf.clear();
            if self.reader.read_line(&mut self.buf)? == 0 {
                self.done = true;
                break;
            }
            if let Some(h) = self.buf.strip_prefix('>') {
                self.peek_header = Some(h.trim().to_string());
                break;
            }
            seq.extend(
                self.buf
                    .bytes()
                    .filter(|b| !b.is_ascii_whitespace())
                    .map(|b| b.to_ascii_uppercase()),
            );
        }

        Ok(Some(FastaRecord { id, seq }))
    }
}

impl<R: BufRead> Iterator for FastaReader<R> {
    type Item = Result<FastaRecord>;

    fn next(&mut self) -> Option<Self::Item> {
        self.next_record().transpose()
    }
}

/// Read every record of a FASTA file. Later duplicates replace earlier ones
/// downstream, so they are reported here.
pub fn read_fasta(path: &Path) -> Result<Vec<(String, Vec<u8>)>> {
    let fh = File::open(path).with_context(|| format!("cannot open FASTA '{}'", path.display()))?;
    let mut records = Vec::new();
    let mut seen = std::collections::HashSet::new();
    for rec in FastaReader::new(BufReader::new(fh)) {
        let rec = rec.with_context(|| format!("failed reading FASTA '{}'", path.display()))?;
        if !seen.insert(rec.id.clone()) {
            warn!("{}: sequence '{}' appears more than once, keeping the last", path.display(), rec.id);
        }
        records.push((rec.id, rec.seq));
    }
    Ok(records)
}

pub fn read_sequences(path: &Path) -> Result<SequenceStore> {
    Ok(SequenceStore::from_records(read_fasta(path)?))
}

pub fn read_alignment(path: &Path) -> Result<PrecomputedAlignment> {
    Ok(PrecomputedAlignment::from_rows(read_fasta(path)?))
}

/// One record per entry, sequence on a single line.
pub fn write_fasta<'a, W, I>(mut w: W, records: I) -> std::io::Result<()>
where
    W: Write,
    I: IntoIterator<Item = (&'a str, &'a [u8])>,
{
    for (id, seq) in records {
        writeln!(w, ">{}", id)?;
        w.write_all(seq)?;
        writeln!(w)?;
    }
    w.flush()
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::io::Cursor;

    #[test]
    fn id_is_first_header_token() {
        let data = b">zotu1;size=12 extra words\nACgT\nac\n>zotu2\nAAA\n";
        let mut r = FastaReader::new(Cursor::new(&data[..]));

        let r1 = r.next_record().unwrap().unwrap();
        assert_eq!(r1.id, "zotu1;size=12");
        assert_eq!(r1.seq, b"ACGTAC");

        let r2 = r.next_record().unwrap().unwrap();
        assert_eq!(r2.id, "zotu2");
        assert_eq!(r2.seq, b"AAA");

        assert!(r.next_record().unwrap().is_none());
    }

    #[test]
    fn crlf_blank_lines_and_gaps() {
        let data = b"\n\n>a desc\r\nAC-g t\r\n ..gt\r\n>b \r\n N N \r\n";
        let recs: Vec<FastaRecord> = FastaReader::new(Cursor::new(&data[..])).collect::<Result<_>>().unwrap();
        assert_eq!(recs.len(), 2);
        assert_eq!(recs[0].id, "a");
        assert_eq!(recs[0].seq, b"AC-GT..GT");
        assert_eq!(recs[1].seq, b"NN");
    }

    #[test]
    fn writes_single_line_records() {
        let mut out = Vec::new();
        write_fasta(&mut out, vec![("x", &b"ACGT"[..]), ("y", &b""[..])]).unwrap();
        assert_eq!(String::from_utf8(out).unwrap(), ">x\nACGT\n>y\n\n");
    }
}
