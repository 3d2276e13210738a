use kira_geo_matrix::domain::GeoSeriesAccession;
use kira_geo_matrix::geo::{series_matrix_file_name, series_matrix_url, series_prefix};

#[test]
fn matrix_url_for_series() {
    let acc: GeoSeriesAccession = "GSE68599".parse().unwrap();
    let url = series_matrix_url(&acc);
    assert!(url.contains("GSE68nnn/GSE68599/matrix/GSE68599_series_matrix.txt.gz"));
    assert_eq!(series_prefix(&acc), "GSE68nnn");
    assert_eq!(series_matrix_file_name(&acc), "GSE68599_series_matrix.txt.gz");
}

#[test]
fn matrix_url_for_short_series() {
    let acc: GeoSeriesAccession = "GSE100".parse().unwrap();
    assert!(series_matrix_url(&acc).contains("/GSEnnn/GSE100/matrix/"));
}
