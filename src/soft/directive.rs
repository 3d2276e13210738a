use crate::error::KiraError;
use crate::soft::record::SeriesRecordBuilder;

pub const TABLE_END: &str = "!series_matrix_table_end";

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Directive {
    SeriesTitle,
    PlatformId,
    SupplementaryFile,
    SampleTitle,
    SampleAccession,
    SampleCharacteristics,
    TableBegin,
}

/// What the parser does after a directive has been applied.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Transition {
    Stay,
    EnterTable,
}

type Handler = fn(&mut SeriesRecordBuilder, usize, &str) -> Result<Transition, KiraError>;

// First match wins. Handlers receive the line number and the text after the prefix.
const DIRECTIVES: &[(&str, Directive, Handler)] = &[
    ("!Series_title", Directive::SeriesTitle, series_title),
    ("!Series_platform_id", Directive::PlatformId, platform_id),
    ("!Series_supplementary_file", Directive::SupplementaryFile, supplementary_file),
    ("!Sample_title", Directive::SampleTitle, sample_title),
    ("!Sample_geo_accession", Directive::SampleAccession, sample_accession),
    ("!Sample_characteristics_ch1", Directive::SampleCharacteristics, sample_characteristics),
    ("!series_matrix_table_begin", Directive::TableBegin, table_begin),
];

impl Directive {
    pub fn match_line(line: &str) -> Option<Directive> {
        lookup(line).map(|(_, directive, _)| directive)
    }

    pub fn prefix(self) -> &'static str {
        DIRECTIVES
            .iter()
            .find(|(_, directive, _)| *directive == self)
            .map(|(prefix, _, _)| *prefix)
            .unwrap_or_default()
    }
}

fn lookup(line: &str) -> Option<(&'static str, Directive, Handler)> {
    DIRECTIVES
        .iter()
        .find(|(prefix, _, _)| line.starts_with(prefix))
        .copied()
}

/// Applies the directive `line` starts with, if any. Lines that match no
/// prefix are ignored.
pub(crate) fn apply(
    builder: &mut SeriesRecordBuilder,
    line_no: usize,
    line: &str,
) -> Result<Option<(Directive, Transition)>, KiraError> {
    let Some((prefix, directive, handler)) = lookup(line) else {
        return Ok(None);
    };
    let transition = handler(builder, line_no, &line[prefix.len()..])?;
    Ok(Some((directive, transition)))
}

pub fn unquote(field: &str) -> &str {
    field.trim().trim_matches('"')
}

/// Splits a tab-delimited directive remainder, dropping the label column.
pub(crate) fn tab_fields(rest: &str) -> Vec<String> {
    rest.split('\t')
        .skip(1)
        .map(|field| unquote(field).to_string())
        .collect()
}

pub(crate) fn whitespace_fields(line: &str) -> Vec<String> {
    line.split_whitespace()
        .map(|field| field.trim_matches('"').to_string())
        .collect()
}

/// Splits a `"<label>: <value>"` characteristics field on the first `": "`.
pub fn parse_characteristic(field: &str) -> Option<(&str, &str)> {
    field.split_once(": ")
}

fn scalar(rest: &str) -> String {
    unquote(rest).to_string()
}

fn series_title(
    builder: &mut SeriesRecordBuilder,
    _line_no: usize,
    rest: &str,
) -> Result<Transition, KiraError> {
    builder.set_title(scalar(rest));
    Ok(Transition::Stay)
}

fn platform_id(
    builder: &mut SeriesRecordBuilder,
    _line_no: usize,
    rest: &str,
) -> Result<Transition, KiraError> {
    builder.set_platform_id(scalar(rest));
    Ok(Transition::Stay)
}

fn supplementary_file(
    builder: &mut SeriesRecordBuilder,
    _line_no: usize,
    rest: &str,
) -> Result<Transition, KiraError> {
    let value = scalar(rest);
    if !value.is_empty() {
        builder.push_supplementary_file(value);
    }
    Ok(Transition::Stay)
}

fn sample_title(
    builder: &mut SeriesRecordBuilder,
    _line_no: usize,
    rest: &str,
) -> Result<Transition, KiraError> {
    builder.set_sample_titles(tab_fields(rest));
    Ok(Transition::Stay)
}

fn sample_accession(
    builder: &mut SeriesRecordBuilder,
    _line_no: usize,
    rest: &str,
) -> Result<Transition, KiraError> {
    builder.set_sample_accessions(tab_fields(rest));
    Ok(Transition::Stay)
}

fn sample_characteristics(
    builder: &mut SeriesRecordBuilder,
    line_no: usize,
    rest: &str,
) -> Result<Transition, KiraError> {
    let fields = tab_fields(rest);
    if fields.is_empty() {
        return Err(KiraError::malformed_at(
            line_no,
            "characteristics directive has no sample fields",
        ));
    }

    // The attribute name is read from the second sample's field; a
    // single-sample series only has the first.
    let label_field = fields.get(1).unwrap_or(&fields[0]);
    let (label, _) = parse_characteristic(label_field).ok_or_else(|| {
        KiraError::malformed_at(
            line_no,
            format!("characteristics field {label_field:?} is not \"label: value\""),
        )
    })?;
    let name = label.trim().replace(' ', "_");

    let values = fields
        .iter()
        .enumerate()
        .map(|(index, field)| {
            parse_characteristic(field)
                .map(|(_, value)| value.to_string())
                .ok_or_else(|| {
                    KiraError::malformed_at(
                        line_no,
                        format!(
                            "characteristics field {} ({field:?}) for attribute {name} has no value",
                            index + 1
                        ),
                    )
                })
        })
        .collect::<Result<Vec<_>, KiraError>>()?;

    builder.push_metadata(name, values);
    Ok(Transition::Stay)
}

fn table_begin(
    builder: &mut SeriesRecordBuilder,
    line_no: usize,
    _rest: &str,
) -> Result<Transition, KiraError> {
    builder.open_table(line_no)?;
    Ok(Transition::EnterTable)
}

#[cfg(test)]
mod tests {
    use assert_matches::assert_matches;

    use super::*;

    #[test]
    fn match_line_by_prefix() {
        assert_eq!(
            Directive::match_line("!Series_title\t\"My Study\""),
            Some(Directive::SeriesTitle)
        );
        assert_eq!(
            Directive::match_line("!Sample_characteristics_ch1\t\"age: 4\""),
            Some(Directive::SampleCharacteristics)
        );
        assert_eq!(
            Directive::match_line("!series_matrix_table_begin"),
            Some(Directive::TableBegin)
        );
        assert_eq!(Directive::match_line("!Series_summary\tx"), None);
        assert_eq!(Directive::match_line(""), None);
        assert_eq!(Directive::TableBegin.prefix(), "!series_matrix_table_begin");
    }

    #[test]
    fn tab_fields_drop_label_and_quotes() {
        assert_eq!(tab_fields("\t\"S1\"\t\"S2\""), vec!["S1", "S2"]);
        assert_eq!(tab_fields("\tGSM1\tGSM2"), vec!["GSM1", "GSM2"]);
    }

    #[test]
    fn whitespace_fields_strip_quotes() {
        assert_eq!(
            whitespace_fields("\"ID_REF\"\t\"GSM1\"  \"GSM2\""),
            vec!["ID_REF", "GSM1", "GSM2"]
        );
    }

    #[test]
    fn characteristic_splits_on_first_separator() {
        assert_eq!(
            parse_characteristic("time: 10:30: am"),
            Some(("time", "10:30: am"))
        );
        assert_eq!(parse_characteristic("no separator"), None);
    }

    #[test]
    fn characteristics_name_uses_second_field_label() {
        let mut builder = SeriesRecordBuilder::default();
        apply(
            &mut builder,
            1,
            "!Sample_characteristics_ch1\t\"cell type: T\"\t\"cell type: B\"",
        )
        .unwrap();
        assert_eq!(builder.metadata_attribute_names(), ["cell_type"]);
    }

    #[test]
    fn characteristics_without_value_is_malformed() {
        let mut builder = SeriesRecordBuilder::default();
        let err = apply(
            &mut builder,
            7,
            "!Sample_characteristics_ch1\t\"tissue: liver\"\t\"\"",
        )
        .unwrap_err();
        assert_matches!(err, KiraError::MalformedDirective { context, .. } if context == "line 7");
    }

    #[test]
    fn unknown_lines_are_ignored() {
        let mut builder = SeriesRecordBuilder::default();
        let applied = apply(&mut builder, 1, "!Series_summary\tsomething").unwrap();
        assert!(applied.is_none());
    }
}
