use crate::domain::transaction::TransactionRecord;
use crate::error::Result;
use std::io::Write;

/// Writes transaction records as CSV.
///
/// Columns: `transaction_id,merchant_id,account_number,amount,timestamp,status`.
/// Fields that could not be parsed from a rejected request are left empty.
pub struct RecordWriter<W: Write> {
    writer: csv::Writer<W>,
}

impl<W: Write> RecordWriter<W> {
    pub fn new(sink: W) -> Self {
        Self {
            writer: csv::Writer::from_writer(sink),
        }
    }

    pub fn write_records(
        &mut self,
        records: impl IntoIterator<Item = TransactionRecord>,
    ) -> Result<()> {
        for record in records {
            self.writer.serialize(record)?;
        }
        self.writer.flush()?;
        Ok(())
    }
}
