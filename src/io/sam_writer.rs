//! SAM header generation.

use std::io::{self, Write};

use crate::index::bntseq::BntSeq;

/// Write the `@HD`/`@SQ`/`@PG` header for an alignment run.
pub fn write_header<W: Write>(
    out: &mut W,
    bns: &BntSeq,
    command_line: Option<&str>,
) -> io::Result<()> {
    writeln!(out, "@HD\tVN:1.6\tSO:unsorted")?;
    for ann in &bns.anns {
        writeln!(out, "@SQ\tSN:{}\tLN:{}", ann.name, ann.len)?;
    }
    write!(
        out,
        "@PG\tID:seedmap\tPN:seedmap\tVN:{}",
        env!("CARGO_PKG_VERSION")
    )?;
    if let Some(cl) = command_line {
        write!(out, "\tCL:{}", cl)?;
    }
    writeln!(out)
}
