use miette::IntoDiagnostic;
use tracing::info;
use xlog::XlogReader;

use crate::args::ListArgs;

pub(crate) fn list(args: ListArgs) -> miette::Result<()> {
	info!("opening reader");
	let reader = XlogReader::open(&args.input).into_diagnostic()?;

	for (index, record) in reader.enumerate() {
		if args.limit.is_some_and(|limit| index >= limit) {
			break;
		}

		let record = record.into_diagnostic()?;
		println!(
			"#{index}: header={} bytes, body={} bytes",
			record.header.len(),
			record.body.len()
		);
	}

	Ok(())
}
