/*!

# Input format

Survey platforms export the answers as a table in which one question may be
spread over many columns. The first row holds the question (or the title of a
group of questions), the second row holds the sub-question, or the option of a
multiple choice question, or a marker such as `Response` /
`Open-Ended Response` for questions that fit in a single column:

| Respondent ID | Age      | מדד אמון | (empty) | בחר/י עד 3 | (empty) | (empty) |
|---------------|----------|----------|---------|------------|---------|---------|
| (empty)       | Response | a        | b       | X          | Y       | אחר     |

Blank cells of the first row repeat the last title on their left, so the
example above has:
- two questions in a single column: `Respondent ID` and `Age`
- an index `מדד אמון` made of the sub-questions `a` and `b`
- a question `בחר/י עד 3` ("pick up to 3") with the options `X` and `Y` and a
  free text `אחר` ("other") option.

The lead-in phrase `אנא ענו על השאלות הבאות` ("please answer the following
questions") in the first row is not a title: the questions that follow it are
not in any section.

## Type row

An optional third header row gives the type of each column:

| code     | meaning                                                   |
|----------|-----------------------------------------------------------|
| `asc5`   | 5-point scale, 5 is the best answer                       |
| `desc5`  | 5-point scale, 1 is the best answer                       |
| `choice` | option of a multiple choice question                      |
| `text`   | free text                                                 |
| `filter` | numbers or short texts, used to filter                    |
| (blank)  | technical column, ignored                                 |

Without a type row, the types are guessed from the answers. The guess is only
meant to start writing a type row, for instance with `sheelon --draft`.

## Scores

All the sub-questions of an index must be `asc5` or `desc5`. Without a type
row, a question whose answers all fall in 1 to 3 is scored like `asc5`. Each
answer is brought to the 3-point scale (1,2 -> 1; 3 -> 2; 4,5 -> 3, after
inverting the `desc5` answers), and each index gets a score per respondent:
the mean of its answers, rounded half up, brought to the 3-point scale.

## Dashboard

The dashboard gets one chart with all the index scores, one chart per index
with its sub-questions, and one chart per multiple choice question. The
charts are placed two per row.

*/
