use crate::domain::RubyVersion;
use crate::error::Result;
use indoc::formatdoc;
use std::io::Write;

pub const ADMIN_LINK: &str = "https://devcenter.heroku.com/admin/changelog_items/new";

/// Write the release note for `version` to `io`
///
/// Preview builds get an extra paragraph pointing at the release they precede.
pub fn write_changelog<W: Write>(version: &RubyVersion, io: &mut W) -> Result<()> {
    writeln!(io, "Add a changelog item: {}", ADMIN_LINK)?;
    writeln!(io)?;

    let raw = version.raw_version();
    let directive = version.major_minor_patch();
    let announcement = formatdoc! {"
        ## Ruby version {raw} is now available

        [Ruby v{raw}](/articles/ruby-support#ruby-versions) is now available on Heroku. To run
        your app using this version of Ruby, add the following `ruby` directive to your Gemfile:

        ```ruby
        ruby \"{directive}\"
        ```

        For more information on [Ruby {raw}, you can view the release announcement](https://www.ruby-lang.org/en/news/).
    "};
    write!(io, "{}", announcement)?;

    if version.preview() {
        let warning = formatdoc! {"

            > Note
            > This version of Ruby is not suitable for production applications.
            > However, it can be used to test that your application is ready for
            > the official release of Ruby {directive} and
            > to provide feedback to the Ruby core team.
        "};
        write!(io, "{}", warning)?;
    }

    Ok(())
}

pub fn changelog(version: &RubyVersion) -> Result<String> {
    let mut out = Vec::new();
    write_changelog(version, &mut out)?;
    Ok(String::from_utf8_lossy(&out).into_owned())
}
