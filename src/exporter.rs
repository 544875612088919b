use std::fmt::Write;

use crate::models::Transaction;
use crate::settings::ExportSettings;

/// MIME type the regenerated document is offered under.
pub const OFX_MIME_TYPE: &str = "application/octet-stream";

const SGML_HEADER: &str = "OFXHEADER:100
DATA:OFXSGML
VERSION:102
SECURITY:NONE
ENCODING:USASCII
CHARSET:1252
COMPRESSION:NONE
OLDFILEUID:NONE
NEWFILEUID:NONE
";

fn escape(text: &str) -> String {
    text.replace('&', "&amp;")
        .replace('<', "&lt;")
        .replace('>', "&gt;")
}

/// Synthetic FITID: the row's position in the exported table, zero-padded.
pub fn fitid(position: usize) -> String {
    format!("{position:06}")
}

pub fn trntype(row: &Transaction) -> &'static str {
    if row.is_credit() {
        "CREDIT"
    } else {
        "DEBIT"
    }
}

/// Render a transaction table as a minimal OFX 1.02 SGML document for a
/// single synthetic bank account. Bank, account and currency come from
/// `settings`, never from the imported statement.
pub fn render_ofx(rows: &[Transaction], settings: &ExportSettings) -> String {
    let mut out = String::with_capacity(1024 + rows.len() * 160);
    out.push_str(SGML_HEADER);
    out.push('\n');

    // Writing into a String cannot fail.
    let _ = write!(
        out,
        "<OFX>
<SIGNONMSGSRSV1>
<SONRS>
<STATUS>
<CODE>0</CODE>
<SEVERITY>INFO</SEVERITY>
</STATUS>
<DTSERVER>{server_date}</DTSERVER>
<LANGUAGE>{language}</LANGUAGE>
</SONRS>
</SIGNONMSGSRSV1>
<BANKMSGSRSV1>
<STMTTRNRS>
<TRNUID>1</TRNUID>
<STATUS>
<CODE>0</CODE>
<SEVERITY>INFO</SEVERITY>
</STATUS>
<STMTRS>
<CURDEF>{currency}</CURDEF>
<BANKACCTFROM>
<BANKID>{bank_id}</BANKID>
<ACCTID>{account_id}</ACCTID>
<ACCTTYPE>{account_type}</ACCTTYPE>
</BANKACCTFROM>
<BANKTRANLIST>
",
        server_date = escape(&settings.server_date),
        language = escape(&settings.language),
        currency = escape(&settings.currency),
        bank_id = escape(&settings.bank_id),
        account_id = escape(&settings.account_id),
        account_type = escape(&settings.account_type),
    );

    for (i, row) in rows.iter().enumerate() {
        let _ = write!(
            out,
            "<STMTTRN>
<TRNTYPE>{trntype}</TRNTYPE>
<DTPOSTED>{posted}</DTPOSTED>
<TRNAMT>{amount}</TRNAMT>
<FITID>{fitid}</FITID>
<MEMO>{memo}</MEMO>
</STMTTRN>
",
            trntype = trntype(row),
            posted = row.date.format("%Y%m%d"),
            amount = row.amount,
            fitid = fitid(i),
            memo = escape(&row.description),
        );
    }

    out.push_str(
        "</BANKTRANLIST>
</STMTRS>
</STMTTRNRS>
</BANKMSGSRSV1>
</OFX>
",
    );
    tracing::debug!(transactions = rows.len(), bytes = out.len(), "rendered OFX");
    out
}
