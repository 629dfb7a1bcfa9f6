use crate::CombinedCorpus;

/// Build the instruction sent to the generation backend.
///
/// Document text and the question are inserted verbatim. Nothing is escaped,
/// so instructions embedded in a PDF reach the model unchanged.
pub fn compose_prompt(question: &str, corpus: &CombinedCorpus) -> String {
    format!(
        "Based on the following text extracted from one or more PDFs, please answer the user's question.\n\
         Analyze the content from all documents provided.\n\
         \n\
         **User's Question:** {question}\n\
         \n\
         ---\n\
         **Combined PDF Content:**\n\
         {corpus}\n\
         ---\n\
         \n\
         **Answer:**\n"
    )
}
