use miette::IntoDiagnostic;
use tracing::info;
use xlog::XlogReader;

use crate::args::DumpArgs;

pub(crate) fn dump(args: DumpArgs) -> miette::Result<()> {
	info!("opening reader");
	let reader = XlogReader::open(&args.input).into_diagnostic()?;

	for (index, record) in reader.enumerate() {
		if args.limit.is_some_and(|limit| index >= limit) {
			break;
		}

		let record = record.into_diagnostic()?;
		let header = rmpv::decode::read_value(&mut &record.header[..]).into_diagnostic()?;
		let body = rmpv::decode::read_value(&mut &record.body[..]).into_diagnostic()?;
		println!("#{index}:");
		println!("  header: {header:?}");
		println!("  body:   {body:?}");
	}

	Ok(())
}
