use clap::Parser;

/// Loads a survey export into a SQLite table and generates the dashboard metadata for it.
#[derive(Parser, Debug, Clone)]
#[clap(author, version, about, long_about = None)]
pub struct Args {
    /// (file path) The survey export, in CSV format. The first two rows (three with --type-row)
    /// are the header.
    #[clap(short, long, value_parser)]
    pub input: String,

    /// (file path, default metadata.yml) Where to write the metadata file. The dashboard
    /// template is read from the same directory, see --meta-prefix.
    #[clap(short, long, value_parser, default_value = "metadata.yml")]
    pub metadata: String,

    /// (default meta-) Prefix of the file name of the dashboard template: with the defaults,
    /// the template is meta-metadata.yml.
    #[clap(short = 'P', long, value_parser, default_value = "meta-")]
    pub meta_prefix: String,

    /// (default sheelon) Name of the table to create and place the data in.
    #[clap(short, long, value_parser, default_value = "sheelon")]
    pub table_name: String,

    /// (file path, default sheelon.db) Name of the database file to place the data in. The file
    /// is recreated.
    #[clap(short = 'D', long, value_parser, default_value = "sheelon.db")]
    pub db_name: String,

    /// If passed, the third row of the input holds the type of each column. See the
    /// documentation for the type codes.
    #[clap(long, takes_value = false)]
    pub type_row: bool,

    /// (column name or not specified) A column with a unique id for each respondent, used as
    /// the primary key of the table instead of the row number.
    #[clap(long, value_parser)]
    pub id_column: Option<String>,

    /// If passed, prints the guessed structure of the survey and a draft type row instead of
    /// loading it.
    #[clap(long, takes_value = false)]
    pub draft: bool,

    /// (file path) A reference metadata file. If provided, sheelon will check that the generated
    /// metadata matches the reference.
    #[clap(short, long, value_parser)]
    pub reference: Option<String>,

    // Other arguments
    /// If passed as an argument, will turn on verbose logging to the standard output.
    #[clap(long, takes_value = false)]
    pub verbose: bool,
}
