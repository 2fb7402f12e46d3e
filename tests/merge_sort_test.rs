use std::error::Error;

use test_utils::build_interpreter;

#[test]
fn merge_sort_in_script() -> Result<(), Box<dyn Error>> {
    let mut ip = build_interpreter(
        r#"
        package sort;

        let datas : list(int) = (5, 1, 3, 2, 4, 8, 6, 7);

        func MergeSort() -> list(int) {
          return call merge_sort:(datas, 0, call datas:size() - 1);
        }

        func merge_sort(list(int) ref datas, int begin, int end) -> list(int) {
          if (end < begin) {
            return new list(int)();
          }
          if (begin == end) {
            return new list(int)(datas[begin]);
          }
          let ret : list(int) = ();
          let mid : int = ((begin + end) / 2);
          let ll : list(int) = call merge_sort:(datas, begin, mid);
          let rl : list(int) = call merge_sort:(datas, mid + 1, end);
          let li : int = (0);
          let ri : int = (0);
          let i : int = (0);
          for (i = begin; i <= end; i = i + 1) {
            if (li == call ll:size()) {
              call ret:push_back(rl[ri]);
              ri = ri + 1;
            } else {
              if (ri == call rl:size()) {
                call ret:push_back(ll[li]);
                li = li + 1;
              } else {
                if (ll[li] < rl[ri]) {
                  call ret:push_back(ll[li]);
                  li = li + 1;
                } else {
                  call ret:push_back(rl[ri]);
                  ri = ri + 1;
                }
              }
            }
          }
          return move ret;
        }
        "#,
    )?;
    let sorted = ip.call_function_by_name("sort$MergeSort", vec![])?;
    let sorted = sorted.borrow();
    assert_eq!(sorted.type_info(), "list(int)");
    let mut values = vec![];
    for i in 0..sorted.list_size()? {
        values.push(sorted.list_at(i as i64)?.borrow().int_value()?);
    }
    assert_eq!(values, vec![1, 2, 3, 4, 5, 6, 7, 8]);

    // the input list is untouched
    let input = ip.find_variable_by_id("sort$datas")?;
    assert_eq!(input.borrow().list_at(0)?.borrow().int_value()?, 5);
    Ok(())
}
